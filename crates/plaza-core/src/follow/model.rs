//! Follow data models.

use serde::Serialize;

use crate::user::UserId;

/// One edge of the follow graph, joined with the other user's display
/// fields.
#[derive(Debug, Clone, Serialize)]
pub struct FollowEntry {
    /// The other user (the one followed, or the follower, depending on
    /// which list was asked for).
    pub user_id: UserId,
    /// Their username.
    pub username: String,
    /// Their avatar URL.
    pub avatar: Option<String>,
    /// When the relation was created.
    pub followed_at: Option<String>,
}
