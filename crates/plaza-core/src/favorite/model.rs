//! Favorite data models.

use serde::Serialize;

use crate::post::PostSummary;

/// One favorited post in a user's list.
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteEntry {
    /// Summary of the favorited post.
    pub post: PostSummary,
    /// When the user favorited it.
    pub favorited_at: Option<String>,
}
