//! Favorite storage repository.

use sqlx::Row;
use sqlx::sqlite::SqlitePool;

use super::model::FavoriteEntry;
use crate::db::Database;
use crate::pagination::{Page, PageRequest};
use crate::post::{PostId, PostKind, PostSummary};
use crate::user::UserId;
use crate::{Error, Result};

/// Repository for favorite storage and retrieval.
pub struct FavoriteRepository {
    pool: SqlitePool,
}

impl FavoriteRepository {
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
            CREATE TABLE IF NOT EXISTS favorites (
                user_id INTEGER NOT NULL,
                post_id INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, post_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_favorites_user_created
            ON favorites(user_id, created_at DESC)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record a favorite.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown post, `Error::Conflict`
    /// when already favorited, or an error if the database operation
    /// fails.
    pub async fn insert(&self, user: UserId, post: PostId) -> Result<()> {
        let exists = sqlx::query("SELECT 1 FROM posts WHERE id = ?")
            .bind(post.0)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(Error::NotFound("post", post.0));
        }

        let inserted =
            sqlx::query("INSERT OR IGNORE INTO favorites (user_id, post_id) VALUES (?, ?)")
                .bind(user.0)
                .bind(post.0)
                .execute(&self.pool)
                .await?;

        if inserted.rows_affected() == 0 {
            return Err(Error::Conflict("post already favorited".to_string()));
        }
        Ok(())
    }

    /// Remove a favorite.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the favorite does not exist, or an
    /// error if the database operation fails.
    pub async fn remove(&self, user: UserId, post: PostId) -> Result<()> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = ? AND post_id = ?")
            .bind(user.0)
            .bind(post.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("favorite", post.0));
        }
        Ok(())
    }

    /// Check whether a user favorited a post.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn contains(&self, user: UserId, post: PostId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM favorites WHERE user_id = ? AND post_id = ?")
            .bind(user.0)
            .bind(post.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// A user's favorites, newest first, joined with post summaries.
    ///
    /// Favorites pointing at moderator-deleted posts are filtered out of
    /// the page (the total still counts them, matching the raw relation).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, user: UserId, page: PageRequest) -> Result<Page<FavoriteEntry>> {
        let rows = sqlx::query(
            r"
            SELECT f.created_at AS favorited_at,
                   p.id AS post_id, p.title, p.kind, p.price, p.images_json,
                   p.created_at AS post_created_at, p.status,
                   u.username AS author_username
            FROM favorites f
            JOIN posts p ON p.id = f.post_id
            JOIN users u ON u.id = p.author_id
            WHERE f.user_id = ? AND p.status != 'deleted'
            ORDER BY f.created_at DESC
            LIMIT ? OFFSET ?
            ",
        )
        .bind(user.0)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let entries = rows
            .iter()
            .map(|row| {
                let images: Vec<String> =
                    serde_json::from_str(&row.get::<String, _>("images_json")).unwrap_or_default();
                FavoriteEntry {
                    post: PostSummary {
                        id: PostId::new(row.get("post_id")),
                        title: row.get("title"),
                        kind: PostKind::parse(row.get("kind")),
                        price: row.get("price"),
                        cover: images.into_iter().next(),
                        author_username: row.get("author_username"),
                        created_at: row.get("post_created_at"),
                    },
                    favorited_at: row.get("favorited_at"),
                }
            })
            .collect();

        let total: i64 = sqlx::query("SELECT COUNT(*) FROM favorites WHERE user_id = ?")
            .bind(user.0)
            .fetch_one(&self.pool)
            .await?
            .get(0);

        #[allow(clippy::cast_sign_loss)]
        Ok(Page::new(entries, page, total as u64))
    }
}
