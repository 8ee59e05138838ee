//! Repository trait implementations for the file-backed catalog.

use crate::{CacheError, Catalog};
use catalog_core::ports::Repository;

mod category;
mod product;

impl Repository for Catalog {
    type Error = CacheError;
}
