//! Category storage repository.

use sqlx::Row;
use sqlx::sqlite::SqlitePool;

use super::model::{Category, CategoryId};
use crate::db::Database;
use crate::post::PostKind;
use crate::{Error, Result};

/// Repository for category storage and retrieval.
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
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
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                post_kind TEXT NOT NULL,
                parent_id INTEGER,
                sort INTEGER NOT NULL DEFAULT 0,
                icon TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_categories_kind_sort
            ON categories(post_kind, sort DESC)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Save a category (insert when unsaved, update otherwise).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn save(&self, category: &mut Category) -> Result<()> {
        if let Some(id) = category.id {
            sqlx::query(
                r"
                UPDATE categories SET
                    name = ?, post_kind = ?, parent_id = ?, sort = ?, icon = ?, is_active = ?
                WHERE id = ?
                ",
            )
            .bind(&category.name)
            .bind(category.post_kind.as_str())
            .bind(category.parent.map(|p| p.0))
            .bind(category.sort)
            .bind(&category.icon)
            .bind(category.is_active)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        } else {
            let result = sqlx::query(
                r"
                INSERT INTO categories (name, post_kind, parent_id, sort, icon, is_active)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(&category.name)
            .bind(category.post_kind.as_str())
            .bind(category.parent.map(|p| p.0))
            .bind(category.sort)
            .bind(&category.icon)
            .bind(category.is_active)
            .execute(&self.pool)
            .await?;

            category.id = Some(CategoryId::new(result.last_insert_rowid()));
        }

        Ok(())
    }

    /// Get category by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query(
            r"
            SELECT id, name, post_kind, parent_id, sort, icon, is_active, created_at
            FROM categories
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_category))
    }

    /// List active categories of one post kind, highest sort weight first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_kind(&self, kind: PostKind) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, post_kind, parent_id, sort, icon, is_active, created_at
            FROM categories
            WHERE post_kind = ? AND is_active = 1
            ORDER BY sort DESC, id ASC
            ",
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_category).collect())
    }

    /// Enable or disable a category for new posts.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown category, or an error if
    /// the database operation fails.
    pub async fn set_active(&self, id: CategoryId, is_active: bool) -> Result<()> {
        let result = sqlx::query("UPDATE categories SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("category", id.0));
        }
        Ok(())
    }

    /// Check that a category exists and accepts new posts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_usable(&self, id: CategoryId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM categories WHERE id = ? AND is_active = 1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Category {
    Category {
        id: Some(CategoryId::new(row.get("id"))),
        name: row.get("name"),
        post_kind: PostKind::parse(row.get("post_kind")),
        parent: row.get::<Option<i64>, _>("parent_id").map(CategoryId::new),
        sort: row.get("sort"),
        icon: row.get("icon"),
        is_active: row.get::<bool, _>("is_active"),
        created_at: row.get("created_at"),
    }
}
