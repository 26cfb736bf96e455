//! Notification data models.

use serde::{Deserialize, Serialize};

use crate::user::UserId;

/// Unique identifier for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub i64);

impl NotificationId {
    /// Create a new notification ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

/// What triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NotificationKind {
    /// Announcement from the platform itself.
    #[default]
    System,
    /// Something happened around a post.
    Post,
    /// Something happened around a comment.
    Comment,
}

impl NotificationKind {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "post" => Self::Post,
            "comment" => Self::Comment,
            _ => Self::System,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }
}

/// A message shown in a user's notification feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier (None for unsaved notifications).
    pub id: Option<NotificationId>,
    /// Receiving user.
    pub recipient: UserId,
    /// Sending user; `None` for system messages.
    pub sender: Option<UserId>,
    /// What triggered the notification.
    pub kind: NotificationKind,
    /// Short headline.
    pub title: String,
    /// Message body.
    pub content: String,
    /// Related record (post, activity, ...), if any.
    pub resource_id: Option<i64>,
    /// Whether the recipient has seen it.
    pub is_read: bool,
    /// Creation timestamp.
    pub created_at: Option<String>,
}

impl Notification {
    /// Create an unsaved system notification.
    #[must_use]
    pub fn system(
        recipient: UserId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            recipient,
            sender: None,
            kind: NotificationKind::System,
            title: title.into(),
            content: content.into(),
            resource_id: None,
            is_read: false,
            created_at: None,
        }
    }

    /// Create an unsaved notification from one user to another.
    #[must_use]
    pub fn from_user(
        recipient: UserId,
        sender: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            recipient,
            sender: Some(sender),
            kind,
            title: title.into(),
            content: content.into(),
            resource_id: None,
            is_read: false,
            created_at: None,
        }
    }

    /// Attach a related record ID.
    #[must_use]
    pub const fn about(mut self, resource_id: i64) -> Self {
        self.resource_id = Some(resource_id);
        self
    }
}

/// A notification joined with its sender's display fields.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    /// The notification itself.
    pub notification: Notification,
    /// Sender's username; `None` for system messages.
    pub sender_username: Option<String>,
    /// Sender's avatar URL.
    pub sender_avatar: Option<String>,
}
