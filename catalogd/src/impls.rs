//! The concrete application wired into the HTTP layer.

use catalog_core::ports::Application;
use catalog_file::Catalog;
use std::sync::Arc;

/// The catalog service application.
///
/// The catalog is opened once at startup and shared by every request.
#[derive(Clone)]
pub struct CatalogApp {
    /// The file-backed catalog
    pub catalog: Arc<Catalog>,
}

impl Application for CatalogApp {
    type Repository = Catalog;

    fn repository(&self) -> Arc<Self::Repository> {
        self.catalog.clone()
    }
}
