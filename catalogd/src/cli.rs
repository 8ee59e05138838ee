//! Command-line interface definition and parsing.
//!
//! This module defines the command-line arguments accepted by the service
//! and loads the `.env` file before they are resolved.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{Level, event};

/// The variable naming the backend root, also used to locate `.env`
pub const ROOT_VAR: &str = "SA_BACKEND_ROOT";

/// Command-line arguments for the catalog service.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short, long, env = "APP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to a dotenv file. Defaults to `.env` in the backend root.
    #[arg(long, env = "APP_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Write the OpenAPI description to this path and exit.
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Load both collections, log the outcome and exit.
    #[arg(long)]
    pub check: bool,
}

impl Cli {
    /// Parse command-line arguments.
    ///
    /// The arguments are parsed twice: once to find the dotenv file, and once
    /// more after it has been loaded, so that variables it defines are seen
    /// by the arguments that fall back to the environment.
    pub fn import() -> Result<Self, clap::Error> {
        let cli = Self::try_parse()?;
        let path = cli.env_file.clone().unwrap_or_else(|| {
            let root = std::env::var_os(ROOT_VAR).map_or_else(|| PathBuf::from("."), PathBuf::from);
            root.join(".env")
        });
        load_env_file(&path, cli.env_file.is_some());
        Self::try_parse()
    }
}

/// Load a dotenv file without overriding variables that are already set.
fn load_env_file(path: &Path, explicit: bool) {
    match dotenvy::from_path(path) {
        Ok(()) => event!(Level::DEBUG, path = %path.display(), "loaded env file"),
        // a missing default file is the normal case
        Err(err) if !explicit && err.not_found() => {}
        Err(err) => event!(
            Level::WARN,
            path = %path.display(),
            err = err.to_string(),
            "failed to load env file"
        ),
    }
}
