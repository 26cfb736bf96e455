//! Category model types.

use serde::{Deserialize, Serialize};

use crate::post::PostKind;

/// Unique identifier for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

impl CategoryId {
    /// Create a new category ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A listing category within one post kind (e.g. "Furniture" under
/// second-hand goods).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier (None for unsaved categories).
    pub id: Option<CategoryId>,
    /// Display name.
    pub name: String,
    /// The post kind this category belongs to.
    pub post_kind: PostKind,
    /// Parent category for nested trees.
    pub parent: Option<CategoryId>,
    /// Sort weight; higher sorts first.
    pub sort: i64,
    /// Icon name or URL.
    pub icon: Option<String>,
    /// Whether new posts may use this category.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: Option<String>,
}

impl Category {
    /// Create a new active category.
    #[must_use]
    pub fn new(name: impl Into<String>, post_kind: PostKind) -> Self {
        Self {
            id: None,
            name: name.into(),
            post_kind,
            parent: None,
            sort: 0,
            icon: None,
            is_active: true,
            created_at: None,
        }
    }

    /// Set the sort weight.
    #[must_use]
    pub const fn with_sort(mut self, sort: i64) -> Self {
        self.sort = sort;
        self
    }

    /// Nest under a parent category.
    #[must_use]
    pub const fn with_parent(mut self, parent: CategoryId) -> Self {
        self.parent = Some(parent);
        self
    }
}
