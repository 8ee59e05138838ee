#![warn(missing_docs)]
// Note: this overwrites the link in the README to point to the rust docs of the catalog-file crate.
//! [catalog_core]: https://docs.rs/catalog_core/latest/catalog_core/index.html
//! [catalog_file]: https://docs.rs/catalog_file/latest/catalog_file/index.html
#![doc = include_str!("../README.md")]

use catalog_core::{
    hierarchy::CategoryIndex,
    ingest::{CategoryCodec, Normalizer, ProductCodec},
    models::{Category, Product},
};
use std::sync::Arc;
use tracing::{Level, event};

mod cache;
pub mod config;
mod r#impl;

pub use cache::{CacheError, Snapshot, ViewCache};
use config::FileConfig;

/// The file-backed catalog.
///
/// This struct holds one [`ViewCache`] per collection and implements the
/// repository traits defined in `catalog-core`. Neither file is read when
/// the catalog is opened; each is read the first time its collection is
/// needed.
///
/// # Example
///
/// ```no_run
/// # use catalog_file::{Catalog, config::FileConfig};
/// # use catalog_core::ports::ProductRepository;
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let catalog = Catalog::open(&FileConfig::default())?;
/// let products = catalog.get_products()?;
/// # Ok(())
/// # }
/// ```
pub struct Catalog {
    /// The product collection
    pub products: ViewCache<Product>,
    /// The category collection
    pub categories: ViewCache<Category>,
    /// The top-level and leaf categories, kept in step with `categories`
    pub index: Arc<CategoryIndex<Category>>,
    normalizer: Normalizer,
}

impl Catalog {
    /// Set up the caches described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotFound`] if `require_existing` is set and the
    /// product file does not exist.
    pub fn open(config: &FileConfig) -> Result<Self, CacheError> {
        let products_file = config.products_file();
        if config.require_existing && !products_file.exists() {
            return Err(CacheError::NotFound(products_file));
        }

        // submissions and file contents share one set of coercion rules
        let normalizer = Normalizer::default();
        let codec = ProductCodec::with_normalizer(normalizer.clone(), config.ingest);
        event!(
            Level::INFO,
            products = %products_file.display(),
            categories = %config.categories_file().display(),
            ingest = ?codec.mode(),
            "opening catalog"
        );

        let index = Arc::new(CategoryIndex::<Category>::default());
        let products = ViewCache::<Product>::new(products_file, codec);
        let categories = ViewCache::<Category>::new(config.categories_file(), CategoryCodec)
            .with_observer(index.clone());

        Ok(Self {
            products,
            categories,
            index,
            normalizer,
        })
    }
}
