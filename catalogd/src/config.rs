//! The service settings, merged from built-in defaults, an optional TOML file
//! and the environment.

use crate::{Cli, cli::ROOT_VAR};
use catalog_axum::config::AxumConfig;
use catalog_file::config::FileConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Variables that predate the `APP_` scheme, and the keys they set.
const LEGACY_VARS: &[(&str, &str)] = &[
    (ROOT_VAR, "files.root_dir"),
    ("PRODUCT_JSON_PATH", "files.products_path"),
    ("CATEGORY_JSON_PATH", "files.categories_path"),
];

/// Settings of every component of the service
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Web server configuration (bind address, page sizes, etc.)
    #[serde(default)]
    pub server: AxumConfig,

    /// Catalog file locations and ingestion settings
    #[serde(default)]
    pub files: FileConfig,
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Legacy variables `SA_BACKEND_ROOT`, `PRODUCT_JSON_PATH` and
    ///    `CATEGORY_JSON_PATH` (highest priority)
    /// 2. Environment variables
    /// 3. Config file given by the CLI
    /// 4. Default values (lowest priority)
    ///
    /// Environment variables are mapped using the pattern:
    /// `APP_<SECTION>__<KEY>` maps to `<section>.<key>`
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Set server bind address
    /// export APP_SERVER__BIND_ADDRESS="0.0.0.0:3000"
    ///
    /// # Read product files as stored records
    /// export APP_FILES__INGEST="internal"
    /// ```
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        Self::load_from(cli, std::env::vars().collect())
    }

    /// Like [`AppConfig::load`], with the environment given explicitly.
    pub fn load_from(cli: &Cli, vars: HashMap<String, String>) -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Start with default values
        config = config.add_source(config::Config::try_from(&Self::default())?);

        // Layer on config file if it is specified and exists
        if let Some(path) = &cli.config {
            if path.exists() {
                config = config.add_source(config::File::from(path.as_path()))
            } else {
                return Err(anyhow::anyhow!(
                    "Config file {} does not exist",
                    path.display()
                ));
            }
        }

        // Legacy variables are read before `vars` moves into the source below
        let legacy: Vec<(&str, Option<String>)> = LEGACY_VARS
            .iter()
            .map(|(var, key)| (*key, vars.get(*var).cloned()))
            .collect();

        // Override with environment variables
        // This maps APP_SERVER__BIND_ADDRESS to server.bind_address
        config = config.add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.into_iter().collect())),
        );

        for (key, value) in legacy {
            config = config.set_override_option(key, value)?;
        }

        let built_config = config.build()?;
        built_config.try_deserialize().map_err(Into::into)
    }
}
