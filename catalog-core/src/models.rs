mod category;
mod product;
mod report;

pub use category::Category;
pub use product::{CustomField, Product};
pub use report::{FilePreview, LoadReport, LoadSource};
