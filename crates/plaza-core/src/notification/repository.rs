//! Notification storage repository.

use sqlx::Row;
use sqlx::sqlite::SqlitePool;

use super::model::{Notification, NotificationId, NotificationKind, NotificationView};
use crate::db::Database;
use crate::pagination::{Page, PageRequest};
use crate::user::UserId;
use crate::{Error, Result};

/// Repository for notification storage and retrieval.
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    /// Create a new repository over the shared database.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails.
    pub async fn new(db: &Database) -> Result<Self> {
        let repo = Self {
            pool: db.pool().clone(),
        };
        repo.initialize().await?;
        Ok(repo)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipient_id INTEGER NOT NULL,
                sender_id INTEGER,
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                resource_id INTEGER,
                is_read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_notifications_recipient_created
            ON notifications(recipient_id, created_at DESC)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_notifications_recipient_unread
            ON notifications(recipient_id, is_read)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create(&self, notification: &mut Notification) -> Result<()> {
        let result = sqlx::query(
            r"
            INSERT INTO notifications (recipient_id, sender_id, kind, title, content, resource_id)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(notification.recipient.0)
        .bind(notification.sender.map(|s| s.0))
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.content)
        .bind(notification.resource_id)
        .execute(&self.pool)
        .await?;

        notification.id = Some(NotificationId::new(result.last_insert_rowid()));
        Ok(())
    }

    /// Store a batch of notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; earlier inserts stay.
    pub async fn create_many(&self, notifications: &mut [Notification]) -> Result<()> {
        for notification in notifications {
            self.create(notification).await?;
        }
        Ok(())
    }

    /// List a recipient's notifications, newest first, optionally
    /// filtered by kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        recipient: UserId,
        kind: Option<NotificationKind>,
        page: PageRequest,
    ) -> Result<Page<NotificationView>> {
        let mut query = sqlx::QueryBuilder::new(
            r"
            SELECT n.id, n.recipient_id, n.sender_id, n.kind, n.title, n.content,
                   n.resource_id, n.is_read, n.created_at,
                   u.username AS sender_username, u.avatar AS sender_avatar
            FROM notifications n
            LEFT JOIN users u ON u.id = n.sender_id
            WHERE n.recipient_id = ",
        );
        query.push_bind(recipient.0);
        if let Some(kind) = kind {
            query.push(" AND n.kind = ").push_bind(kind.as_str());
        }
        query
            .push(" ORDER BY n.created_at DESC, n.id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query.build().fetch_all(&self.pool).await?;
        let views = rows
            .iter()
            .map(|row| NotificationView {
                notification: row_to_notification(row),
                sender_username: row.get("sender_username"),
                sender_avatar: row.get("sender_avatar"),
            })
            .collect();

        let mut count =
            sqlx::QueryBuilder::new("SELECT COUNT(*) FROM notifications WHERE recipient_id = ");
        count.push_bind(recipient.0);
        if let Some(kind) = kind {
            count.push(" AND kind = ").push_bind(kind.as_str());
        }
        let total: i64 = count.build().fetch_one(&self.pool).await?.get(0);

        #[allow(clippy::cast_sign_loss)]
        Ok(Page::new(views, page, total as u64))
    }

    /// Mark one notification as read, recipient-scoped.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the notification does not exist or
    /// belongs to someone else, or an error if the database operation
    /// fails.
    pub async fn mark_read(&self, id: NotificationId, recipient: UserId) -> Result<()> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND recipient_id = ?")
                .bind(id.0)
                .bind(recipient.0)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("notification", id.0));
        }
        Ok(())
    }

    /// Mark everything unread as read. Returns the affected count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn mark_all_read(&self, recipient: UserId) -> Result<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE recipient_id = ? AND is_read = 0")
                .bind(recipient.0)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Count unread notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn unread_count(&self, recipient: UserId) -> Result<u64> {
        let total: i64 =
            sqlx::query("SELECT COUNT(*) FROM notifications WHERE recipient_id = ? AND is_read = 0")
                .bind(recipient.0)
                .fetch_one(&self.pool)
                .await?
                .get(0);
        #[allow(clippy::cast_sign_loss)]
        Ok(total as u64)
    }
}

fn row_to_notification(row: &sqlx::sqlite::SqliteRow) -> Notification {
    Notification {
        id: Some(NotificationId::new(row.get("id"))),
        recipient: UserId::new(row.get("recipient_id")),
        sender: row.get::<Option<i64>, _>("sender_id").map(UserId::new),
        kind: NotificationKind::parse(row.get("kind")),
        title: row.get("title"),
        content: row.get("content"),
        resource_id: row.get("resource_id"),
        is_read: row.get::<bool, _>("is_read"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::user::{User, UserRepository};

    async fn setup() -> (NotificationRepository, UserId, UserId) {
        let db = Database::in_memory().await.unwrap();
        let users = UserRepository::new(&db).await.unwrap();

        let mut alice = User::new("alice_1", "alice@example.com");
        users.create(&mut alice, "abc123").await.unwrap();
        let mut bob = User::new("bob_22", "bob@example.com");
        users.create(&mut bob, "abc123").await.unwrap();

        let repo = NotificationRepository::new(&db).await.unwrap();
        (repo, alice.id.unwrap(), bob.id.unwrap())
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (repo, alice, bob) = setup().await;

        let mut n = Notification::from_user(
            alice,
            bob,
            NotificationKind::Post,
            "New comment",
            "bob_22 commented on your post",
        )
        .about(7);
        repo.create(&mut n).await.unwrap();

        let page = repo.list(alice, None, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
        let view = &page.items[0];
        assert_eq!(view.sender_username.as_deref(), Some("bob_22"));
        assert_eq!(view.notification.resource_id, Some(7));
        assert!(!view.notification.is_read);
    }

    #[tokio::test]
    async fn test_kind_filter() {
        let (repo, alice, _bob) = setup().await;

        let mut system = Notification::system(alice, "Maintenance", "Back soon");
        repo.create(&mut system).await.unwrap();

        let page = repo
            .list(alice, Some(NotificationKind::Post), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);

        let page = repo
            .list(alice, Some(NotificationKind::System), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert!(page.items[0].sender_username.is_none());
    }

    #[tokio::test]
    async fn test_mark_read_is_recipient_scoped() {
        let (repo, alice, bob) = setup().await;

        let mut n = Notification::system(alice, "Hello", "First notice");
        repo.create(&mut n).await.unwrap();
        let id = n.id.unwrap();

        let err = repo.mark_read(id, bob).await.unwrap_err();
        assert!(matches!(err, Error::NotFound("notification", _)));

        repo.mark_read(id, alice).await.unwrap();
        assert_eq!(repo.unread_count(alice).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_all_read_and_unread_count() {
        let (repo, alice, _bob) = setup().await;

        for i in 0..3 {
            let mut n = Notification::system(alice, format!("Notice {i}"), "body");
            repo.create(&mut n).await.unwrap();
        }
        assert_eq!(repo.unread_count(alice).await.unwrap(), 3);

        let affected = repo.mark_all_read(alice).await.unwrap();
        assert_eq!(affected, 3);
        assert_eq!(repo.unread_count(alice).await.unwrap(), 0);
    }
}
