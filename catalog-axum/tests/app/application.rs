use catalog_core::ports::Application;
use catalog_file::{Catalog, config::FileConfig};
use serde_json::{Value, json};
use std::{fs, path::Path, sync::Arc};
use tempfile::TempDir;

/// A catalog over files in a private temporary directory.
#[derive(Clone)]
pub struct TestApp {
    pub catalog: Arc<Catalog>,
    pub root: Arc<TempDir>,
}

impl TestApp {
    pub fn new(products: Option<Value>, categories: Option<Value>) -> Self {
        let root = TempDir::new().unwrap();
        let data = root.path().join("data");
        fs::create_dir_all(&data).unwrap();
        if let Some(products) = products {
            fs::write(data.join("products.json"), products.to_string()).unwrap();
        }
        if let Some(categories) = categories {
            fs::write(data.join("categories.json"), categories.to_string()).unwrap();
        }

        let config = FileConfig {
            root_dir: root.path().to_path_buf(),
            products_path: "data/products.json".into(),
            categories_path: "data/categories.json".into(),
            ..Default::default()
        };
        Self {
            catalog: Arc::new(Catalog::open(&config).unwrap()),
            root: Arc::new(root),
        }
    }

    /// A small catalog with one bad product
    pub fn seeded() -> Self {
        Self::new(
            Some(json!({
                "data": [
                    { "id": 1, "title": "Lamp", "currency": "USD", "category_id": 3, "converted_price": 12 },
                    { "id": 2, "title": "Rug", "currency": "USD", "category_id": 4, "boost": 1 },
                    { "id": 3, "title": "Broken", "category_id": 4 },
                ]
            })),
            Some(json!([
                { "id": 1, "name": "Home" },
                { "id": 3, "name": "Lamps", "parent_id": 1 },
                { "id": 4, "name": "Rugs", "parent_id": 1 },
                { "id": 5, "name": "Chairs", "parent_id": 1 },
                { "id": 6, "name": "Tables", "parent_id": 1 },
                { "id": 7, "name": "Shelves", "parent_id": 1 },
            ])),
        )
    }

    pub fn write(&self, file: &str, document: Value) {
        fs::write(self.path(file), document.to_string()).unwrap();
    }

    pub fn path(&self, file: &str) -> std::path::PathBuf {
        Path::new(self.root.path()).join("data").join(file)
    }
}

impl Application for TestApp {
    type Repository = Catalog;

    fn repository(&self) -> Arc<Self::Repository> {
        self.catalog.clone()
    }
}
