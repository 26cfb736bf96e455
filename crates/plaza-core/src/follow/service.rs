//! Follow service.
//!
//! Enforces the self-follow and existence rules and notifies the
//! followed user.

use super::repository::FollowRepository;
use crate::notification::NotificationService;
use crate::user::{UserId, UserRepository};
use crate::{Error, Result};

/// Service for following and unfollowing users.
pub struct FollowService {
    follows: FollowRepository,
    users: UserRepository,
    notifications: NotificationService,
}

impl FollowService {
    /// Create a service over the given repositories.
    #[must_use]
    pub const fn new(
        follows: FollowRepository,
        users: UserRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            follows,
            users,
            notifications,
        }
    }

    /// The underlying follow repository, for read-side operations.
    #[must_use]
    pub const fn follows(&self) -> &FollowRepository {
        &self.follows
    }

    /// Follow another user and let them know.
    ///
    /// # Errors
    ///
    /// `Error::InvalidState` for a self-follow, `Error::NotFound` for an
    /// unknown target, `Error::Conflict` when already following, or an
    /// error if a database operation fails.
    pub async fn follow(&self, follower: UserId, target: UserId) -> Result<()> {
        if follower == target {
            return Err(Error::InvalidState("cannot follow yourself".to_string()));
        }

        let follower_user = self
            .users
            .get(follower)
            .await?
            .ok_or(Error::NotFound("user", follower.0))?;
        if self.users.get(target).await?.is_none() {
            return Err(Error::NotFound("user", target.0));
        }

        self.follows.insert(follower, target).await?;

        self.notifications
            .notify_post(
                target,
                follower,
                "New follower",
                &format!("{} started following you", follower_user.username),
                None,
            )
            .await?;

        Ok(())
    }

    /// Stop following another user.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when there was no follow relation, or
    /// an error if the database operation fails.
    pub async fn unfollow(&self, follower: UserId, target: UserId) -> Result<()> {
        self.follows.remove(follower, target).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::notification::NotificationRepository;
    use crate::pagination::PageRequest;
    use crate::user::User;

    async fn setup() -> (FollowService, NotificationRepository, UserId, UserId) {
        let db = Database::in_memory().await.unwrap();

        let users = UserRepository::new(&db).await.unwrap();
        let mut alice = User::new("alice_1", "alice@example.com");
        users.create(&mut alice, "abc123").await.unwrap();
        let mut bob = User::new("bob_22", "bob@example.com");
        users.create(&mut bob, "abc123").await.unwrap();

        let service = FollowService::new(
            FollowRepository::new(&db).await.unwrap(),
            users,
            NotificationService::new(NotificationRepository::new(&db).await.unwrap()),
        );
        let notifications = NotificationRepository::new(&db).await.unwrap();

        (service, notifications, alice.id.unwrap(), bob.id.unwrap())
    }

    #[tokio::test]
    async fn test_follow_notifies_target() {
        let (service, notifications, alice, bob) = setup().await;

        service.follow(alice, bob).await.unwrap();

        let inbox = notifications
            .list(bob, None, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(inbox.total, 1);
        assert!(inbox.items[0].notification.content.contains("alice_1"));
    }

    #[tokio::test]
    async fn test_self_follow_is_rejected() {
        let (service, _notifications, alice, _bob) = setup().await;

        let err = service.follow(alice, alice).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_follow_unknown_target() {
        let (service, _notifications, alice, _bob) = setup().await;

        let err = service.follow(alice, UserId::new(404)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound("user", 404)));
    }
}
