use crate::models::{Category, LoadReport};

/// Repository interface for the category tree.
///
/// Categories form a forest through their `parent_id` links:
/// - Top-level categories have no parent
/// - Leaf categories are not the parent of any other category
///
/// Both subsets are derived from the collection and rebuilt after a reload.
pub trait CategoryRepository: super::Repository {
    /// Get a copy of every category.
    fn get_categories(&self) -> Result<Vec<Category>, Self::Error>;

    /// Get the categories without a parent.
    fn top_level_categories(&self) -> Result<Vec<Category>, Self::Error>;

    /// Get a page of the categories without children.
    ///
    /// An `offset` past the end, or a `limit` of zero, yields an empty page.
    fn leaf_categories(&self, offset: usize, limit: usize) -> Result<Vec<Category>, Self::Error>;

    /// Re-read the backing store and replace the tree.
    fn reload_categories(&self) -> Result<LoadReport, Self::Error>;
}
