//! Comment data models.

use serde::{Deserialize, Serialize};

use crate::post::PostId;
use crate::user::UserId;

/// Unique identifier for a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(pub i64);

impl CommentId {
    /// Create a new comment ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

/// Visibility state of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CommentStatus {
    /// Visible under the post.
    #[default]
    Active,
    /// Removed by its author.
    Deleted,
}

impl CommentStatus {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "deleted" => Self::Deleted,
            _ => Self::Active,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deleted => "deleted",
        }
    }
}

/// A comment under a post, possibly replying to another comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier (None for unsaved comments).
    pub id: Option<CommentId>,
    /// Comment text.
    pub content: String,
    /// Who wrote it.
    pub author: UserId,
    /// The post it belongs to.
    pub post: PostId,
    /// Parent comment when this is a reply.
    pub parent: Option<CommentId>,
    /// Visibility state.
    pub status: CommentStatus,
    /// Like counter.
    pub likes: i64,
    /// Creation timestamp.
    pub created_at: Option<String>,
}

impl Comment {
    /// Create an unsaved top-level comment.
    #[must_use]
    pub fn new(content: impl Into<String>, author: UserId, post: PostId) -> Self {
        Self {
            id: None,
            content: content.into(),
            author,
            post,
            parent: None,
            status: CommentStatus::Active,
            likes: 0,
            created_at: None,
        }
    }

    /// Turn the comment into a reply to another comment.
    #[must_use]
    pub const fn replying_to(mut self, parent: CommentId) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// A comment joined with its author's display fields.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    /// The comment itself.
    pub comment: Comment,
    /// Author's username.
    pub author_username: String,
    /// Author's avatar URL.
    pub author_avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for status in [CommentStatus::Active, CommentStatus::Deleted] {
            assert_eq!(CommentStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn reply_links_parent() {
        let comment =
            Comment::new("agreed", UserId::new(1), PostId::new(2)).replying_to(CommentId::new(3));
        assert_eq!(comment.parent, Some(CommentId::new(3)));
    }
}
