use crate::hierarchy::Node;
use serde::{Deserialize, Serialize};

/// A node of the category tree.
///
/// Whether a category is top-level or a leaf is never stored; it follows from
/// the `parent_id` links of the collection the category belongs to (see
/// [`crate::hierarchy::CategoryIndex`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Category {
    /// The identifier of the category
    pub id: u32,
    /// The display name
    #[serde(default)]
    pub name: String,
    /// The enclosing category, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u32>,
}

impl Category {
    /// Create a category with the given parent
    pub fn new(id: u32, name: impl Into<String>, parent_id: Option<u32>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
        }
    }
}

impl Node for Category {
    fn node_id(&self) -> u32 {
        self.id
    }

    fn parent_id(&self) -> Option<u32> {
        self.parent_id
    }
}
