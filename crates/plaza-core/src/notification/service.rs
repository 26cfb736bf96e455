//! Notification service.
//!
//! Thin construction helpers over the repository so callers don't
//! assemble [`Notification`] values by hand.

use tracing::debug;

use super::model::{Notification, NotificationKind};
use super::repository::NotificationRepository;
use crate::Result;
use crate::user::UserId;

/// Service for creating and delivering notifications.
pub struct NotificationService {
    repository: NotificationRepository,
}

impl NotificationService {
    /// Create a service over the given repository.
    #[must_use]
    pub const fn new(repository: NotificationRepository) -> Self {
        Self { repository }
    }

    /// The underlying repository, for read-side operations.
    #[must_use]
    pub const fn repository(&self) -> &NotificationRepository {
        &self.repository
    }

    /// Send a system announcement to one user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn notify_system(
        &self,
        recipient: UserId,
        title: &str,
        content: &str,
        resource_id: Option<i64>,
    ) -> Result<Notification> {
        let mut notification = Notification::system(recipient, title, content);
        notification.resource_id = resource_id;
        self.repository.create(&mut notification).await?;
        Ok(notification)
    }

    /// Send a post-related notification from one user to another.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn notify_post(
        &self,
        recipient: UserId,
        sender: UserId,
        title: &str,
        content: &str,
        post_id: Option<i64>,
    ) -> Result<Notification> {
        let mut notification =
            Notification::from_user(recipient, sender, NotificationKind::Post, title, content);
        notification.resource_id = post_id;
        self.repository.create(&mut notification).await?;
        Ok(notification)
    }

    /// Send a comment-related notification from one user to another.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn notify_comment(
        &self,
        recipient: UserId,
        sender: UserId,
        title: &str,
        content: &str,
        post_id: Option<i64>,
    ) -> Result<Notification> {
        let mut notification =
            Notification::from_user(recipient, sender, NotificationKind::Comment, title, content);
        notification.resource_id = post_id;
        self.repository.create(&mut notification).await?;
        Ok(notification)
    }

    /// Send the same message to many recipients.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; earlier inserts stay.
    pub async fn notify_batch(
        &self,
        recipients: &[UserId],
        kind: NotificationKind,
        sender: Option<UserId>,
        title: &str,
        content: &str,
        resource_id: Option<i64>,
    ) -> Result<()> {
        let mut notifications: Vec<Notification> = recipients
            .iter()
            .map(|&recipient| Notification {
                id: None,
                recipient,
                sender,
                kind,
                title: title.to_string(),
                content: content.to_string(),
                resource_id,
                is_read: false,
                created_at: None,
            })
            .collect();

        self.repository.create_many(&mut notifications).await?;
        debug!("delivered {} notifications", notifications.len());
        Ok(())
    }
}
