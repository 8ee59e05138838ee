use crate::{
    ingest::IngestError,
    models::{FilePreview, LoadReport, Product},
};
use std::sync::Arc;

/// Repository interface for the product collection.
///
/// The collection is held in memory and populated from its backing store the
/// first time it is needed. Readers receive a shared, read-only snapshot;
/// a reload replaces the snapshot wholesale.
pub trait ProductRepository: super::Repository {
    /// Get the current collection, populating it first if necessary.
    fn get_products(&self) -> Result<Arc<[Product]>, Self::Error>;

    /// Get the diagnostics of the most recent population.
    fn product_report(&self) -> Result<LoadReport, Self::Error>;

    /// Re-read the backing store and replace the collection.
    ///
    /// On failure the previously held collection stays in place.
    fn reload_products(&self) -> Result<LoadReport, Self::Error>;

    /// Build a product from user-submitted JSON and append it to the store.
    ///
    /// # Returns
    ///
    /// Ok(Ok(product)) with the assigned identifier if the product was stored.
    ///
    /// Ok(Err(reason)) if the submitted JSON was rejected. Unlike file
    /// loads, user submissions fail fast on the first problem.
    fn create_product(
        &self,
        item: &serde_json::Value,
    ) -> Result<Result<Product, IngestError>, Self::Error>;

    /// Describe where the collection is stored, for diagnostics.
    fn product_location(&self) -> String;

    /// Peek at the first `max_bytes` of the backing file.
    fn preview_products(&self, max_bytes: usize) -> Result<FilePreview, Self::Error>;
}
