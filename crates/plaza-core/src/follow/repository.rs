//! Follow graph storage repository.

use sqlx::Row;
use sqlx::sqlite::SqlitePool;

use super::model::FollowEntry;
use crate::db::Database;
use crate::pagination::{Page, PageRequest};
use crate::user::UserId;
use crate::{Error, Result};

/// Repository for the follower/following graph.
pub struct FollowRepository {
    pool: SqlitePool,
}

impl FollowRepository {
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
            CREATE TABLE IF NOT EXISTS follows (
                follower_id INTEGER NOT NULL,
                following_id INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(follower_id, following_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_follows_follower
            ON follows(follower_id, created_at DESC)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_follows_following
            ON follows(following_id, created_at DESC)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record a follow edge.
    ///
    /// # Errors
    ///
    /// Returns `Error::Conflict` when the edge already exists, or an
    /// error if the database operation fails.
    pub async fn insert(&self, follower: UserId, following: UserId) -> Result<()> {
        let inserted =
            sqlx::query("INSERT OR IGNORE INTO follows (follower_id, following_id) VALUES (?, ?)")
                .bind(follower.0)
                .bind(following.0)
                .execute(&self.pool)
                .await?;

        if inserted.rows_affected() == 0 {
            return Err(Error::Conflict("already following this user".to_string()));
        }
        Ok(())
    }

    /// Remove a follow edge.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the edge does not exist, or an
    /// error if the database operation fails.
    pub async fn remove(&self, follower: UserId, following: UserId) -> Result<()> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND following_id = ?")
            .bind(follower.0)
            .bind(following.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("follow", following.0));
        }
        Ok(())
    }

    /// Check whether `follower` follows `following`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_following(&self, follower: UserId, following: UserId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM follows WHERE follower_id = ? AND following_id = ?")
            .bind(follower.0)
            .bind(following.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Users that `user` follows, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn following(&self, user: UserId, page: PageRequest) -> Result<Page<FollowEntry>> {
        let rows = sqlx::query(
            r"
            SELECT f.following_id AS user_id, f.created_at, u.username, u.avatar
            FROM follows f
            JOIN users u ON u.id = f.following_id
            WHERE f.follower_id = ?
            ORDER BY f.created_at DESC
            LIMIT ? OFFSET ?
            ",
        )
        .bind(user.0)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let entries = rows.iter().map(row_to_entry).collect();

        let total: i64 = sqlx::query("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
            .bind(user.0)
            .fetch_one(&self.pool)
            .await?
            .get(0);

        #[allow(clippy::cast_sign_loss)]
        Ok(Page::new(entries, page, total as u64))
    }

    /// Users following `user`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn followers(&self, user: UserId, page: PageRequest) -> Result<Page<FollowEntry>> {
        let rows = sqlx::query(
            r"
            SELECT f.follower_id AS user_id, f.created_at, u.username, u.avatar
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.following_id = ?
            ORDER BY f.created_at DESC
            LIMIT ? OFFSET ?
            ",
        )
        .bind(user.0)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let entries = rows.iter().map(row_to_entry).collect();

        let total: i64 = sqlx::query("SELECT COUNT(*) FROM follows WHERE following_id = ?")
            .bind(user.0)
            .fetch_one(&self.pool)
            .await?
            .get(0);

        #[allow(clippy::cast_sign_loss)]
        Ok(Page::new(entries, page, total as u64))
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> FollowEntry {
    FollowEntry {
        user_id: UserId::new(row.get("user_id")),
        username: row.get("username"),
        avatar: row.get("avatar"),
        followed_at: row.get("created_at"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::user::{User, UserRepository};

    async fn setup() -> (FollowRepository, UserId, UserId) {
        let db = Database::in_memory().await.unwrap();
        let users = UserRepository::new(&db).await.unwrap();

        let mut alice = User::new("alice_1", "alice@example.com");
        users.create(&mut alice, "abc123").await.unwrap();
        let mut bob = User::new("bob_22", "bob@example.com");
        users.create(&mut bob, "abc123").await.unwrap();

        let repo = FollowRepository::new(&db).await.unwrap();
        (repo, alice.id.unwrap(), bob.id.unwrap())
    }

    #[tokio::test]
    async fn test_follow_and_lists() {
        let (repo, alice, bob) = setup().await;

        repo.insert(alice, bob).await.unwrap();
        assert!(repo.is_following(alice, bob).await.unwrap());
        assert!(!repo.is_following(bob, alice).await.unwrap());

        let following = repo.following(alice, PageRequest::default()).await.unwrap();
        assert_eq!(following.total, 1);
        assert_eq!(following.items[0].username, "bob_22");

        let followers = repo.followers(bob, PageRequest::default()).await.unwrap();
        assert_eq!(followers.total, 1);
        assert_eq!(followers.items[0].username, "alice_1");
    }

    #[tokio::test]
    async fn test_duplicate_follow_conflicts() {
        let (repo, alice, bob) = setup().await;

        repo.insert(alice, bob).await.unwrap();
        let err = repo.insert(alice, bob).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unfollow_missing_edge() {
        let (repo, alice, bob) = setup().await;

        let err = repo.remove(alice, bob).await.unwrap_err();
        assert!(matches!(err, Error::NotFound("follow", _)));

        repo.insert(alice, bob).await.unwrap();
        repo.remove(alice, bob).await.unwrap();
        assert!(!repo.is_following(alice, bob).await.unwrap());
    }
}
