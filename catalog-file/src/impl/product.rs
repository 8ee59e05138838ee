use crate::Catalog;
use catalog_core::{
    ingest::{IngestError, ProductFactory},
    models::{FilePreview, LoadReport, Product},
    ports::ProductRepository,
};
use std::sync::Arc;
use tracing::{Level, event};

impl ProductRepository for Catalog {
    fn get_products(&self) -> Result<Arc<[Product]>, Self::Error> {
        self.products.get_all()
    }

    fn product_report(&self) -> Result<LoadReport, Self::Error> {
        Ok(self.products.snapshot()?.report)
    }

    fn reload_products(&self) -> Result<LoadReport, Self::Error> {
        self.products.reload()
    }

    fn create_product(
        &self,
        item: &serde_json::Value,
    ) -> Result<Result<Product, IngestError>, Self::Error> {
        let item = match self.normalizer.normalize_item(item.clone()) {
            Ok(item) => item,
            Err(err) => return Ok(Err(err.into())),
        };

        self.products.update(|records| -> Result<Product, IngestError> {
            let mut product = ProductFactory::create(&item)?;
            // identifiers are assigned here, whatever the submission said
            if !product.is_pending() {
                event!(Level::DEBUG, submitted = product.id, "ignoring submitted id");
            }
            product.id = records
                .iter()
                .map(|existing| existing.id)
                .max()
                .unwrap_or_default()
                .saturating_add(1);
            records.push(product.clone());
            Ok(product)
        })
    }

    fn product_location(&self) -> String {
        self.products.path().display().to_string()
    }

    fn preview_products(&self, max_bytes: usize) -> Result<FilePreview, Self::Error> {
        self.products.preview(max_bytes)
    }
}
