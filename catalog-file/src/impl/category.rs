use crate::Catalog;
use catalog_core::{
    models::{Category, LoadReport},
    ports::CategoryRepository,
};

// The index is only as fresh as the last publication of the category cache,
// so every read makes sure the cache has been populated first.
impl CategoryRepository for Catalog {
    fn get_categories(&self) -> Result<Vec<Category>, Self::Error> {
        Ok(self.categories.get_all()?.to_vec())
    }

    fn top_level_categories(&self) -> Result<Vec<Category>, Self::Error> {
        self.categories.get_all()?;
        Ok(self.index.top_level())
    }

    fn leaf_categories(&self, offset: usize, limit: usize) -> Result<Vec<Category>, Self::Error> {
        self.categories.get_all()?;
        Ok(self.index.leaves(offset, limit))
    }

    fn reload_categories(&self) -> Result<LoadReport, Self::Error> {
        self.categories.reload()
    }
}
