//! Configuration types for the file-backed catalog.
//!
//! This module controls where the collection files live and how their
//! contents are ingested.

use catalog_core::ingest::IngestMode;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Configuration for the catalog files.
///
/// Relative paths are resolved against `root_dir`.
///
/// # Examples
///
/// ```
/// use catalog_file::config::FileConfig;
/// use std::path::{Path, PathBuf};
///
/// let config = FileConfig {
///     root_dir: PathBuf::from("/srv/shop"),
///     ..Default::default()
/// };
/// assert_eq!(
///     config.products_file(),
///     Path::new("/srv/shop/config/data/products.json")
/// );
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileConfig {
    /// The directory relative paths are resolved against
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// The product collection file
    #[serde(default = "default_products_path")]
    pub products_path: PathBuf,

    /// The category collection file
    #[serde(default = "default_categories_path")]
    pub categories_path: PathBuf,

    /// How product files are ingested
    #[serde(default)]
    pub ingest: IngestMode,

    /// Refuse to open the catalog when the product file does not exist
    #[serde(default)]
    pub require_existing: bool,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_products_path() -> PathBuf {
    PathBuf::from("config/data/products.json")
}

fn default_categories_path() -> PathBuf {
    PathBuf::from("config/data/categories.json")
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            products_path: default_products_path(),
            categories_path: default_categories_path(),
            ingest: IngestMode::default(),
            require_existing: false,
        }
    }
}

impl FileConfig {
    /// The resolved location of the product file
    pub fn products_file(&self) -> PathBuf {
        self.resolve(&self.products_path)
    }

    /// The resolved location of the category file
    pub fn categories_file(&self) -> PathBuf {
        self.resolve(&self.categories_path)
    }

    /// Join `path` onto the root directory (unless it is absolute) and
    /// normalize the result lexically. The filesystem is not consulted, so
    /// symlinks are not followed.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        normalize(&self.root_dir.join(path))
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case::relative(".", "config/data/products.json", "config/data/products.json")]
    #[case::rooted("/srv/shop", "./data/../catalog.json", "/srv/shop/catalog.json")]
    #[case::absolute("/srv/shop", "/var/lib/products.json", "/var/lib/products.json")]
    #[case::above_root("/", "../products.json", "/products.json")]
    #[case::leading_parent("..", "data/products.json", "../data/products.json")]
    #[case::cancels_out("data", "..", ".")]
    fn test_resolve(#[case] root: &str, #[case] path: &str, #[case] expected: &str) {
        let config = FileConfig {
            root_dir: root.into(),
            ..Default::default()
        };
        assert_eq!(config.resolve(Path::new(path)), Path::new(expected));
    }

    #[test]
    fn test_partial_config() {
        let config: FileConfig =
            serde_json::from_str(r#"{ "root_dir": "/srv", "ingest": "internal" }"#).unwrap();
        assert_eq!(config.ingest, IngestMode::Internal);
        assert_eq!(config.products_path, default_products_path());
        assert!(!config.require_existing);
    }
}
