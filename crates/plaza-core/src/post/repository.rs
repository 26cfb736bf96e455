//! Post storage repository.
//!
//! Posts are mirrored into an FTS5 table by triggers so keyword search
//! can be handed to the engine's own planner. Structured fields that
//! only some kinds carry (job, house, contact) are stored as JSON
//! columns.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use super::model::{
    Contact, GeoPoint, HouseDetails, JobDetails, Location, Post, PostDetail, PostId, PostKind,
    PostStatus,
};
use crate::category::CategoryId;
use crate::db::Database;
use crate::pagination::{Page, PageRequest};
use crate::user::UserId;
use crate::{Error, Result};

/// Filters for post listings.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Restrict to one kind.
    pub kind: Option<PostKind>,
    /// Restrict to one category.
    pub category_id: Option<CategoryId>,
    /// Restrict to one status; `None` matches every status.
    pub status: Option<PostStatus>,
    /// Substring match over title and content.
    pub keyword: Option<String>,
    /// Restrict to one author.
    pub author: Option<UserId>,
}

/// Partial post update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    /// New headline.
    pub title: Option<String>,
    /// New body text.
    pub content: Option<String>,
    /// New asking price.
    pub price: Option<f64>,
    /// Replacement image list.
    pub images: Option<Vec<String>>,
    /// Replacement contact details.
    pub contact: Option<Contact>,
}

/// Repository for post storage and retrieval.
#[derive(Debug)]
pub struct PostRepository {
    pool: SqlitePool,
}

impl PostRepository {
    /// Create a new repository over the shared database.
    ///
    /// Creates the post tables, the FTS5 mirror, and its sync triggers.
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

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                kind TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                price REAL,
                job_json TEXT,
                house_json TEXT,
                images_json TEXT NOT NULL DEFAULT '[]',
                longitude REAL NOT NULL,
                latitude REAL NOT NULL,
                address TEXT,
                city TEXT,
                district TEXT,
                contact_json TEXT,
                author_id INTEGER NOT NULL,
                views INTEGER NOT NULL DEFAULT 0,
                favorites INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'pending',
                review_reason TEXT,
                reviewed_at TEXT,
                reviewer_id INTEGER,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                expires_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_posts_kind_status_created
            ON posts(kind, status, created_at DESC)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_posts_category_status
            ON posts(category_id, status)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_posts_author_status
            ON posts(author_id, status)
            ",
        )
        .execute(&self.pool)
        .await?;

        // Keyword search is delegated to the engine: an external-content
        // FTS5 table kept in sync by triggers.
        sqlx::query(
            r"
            CREATE VIRTUAL TABLE IF NOT EXISTS posts_fts
            USING fts5(title, content, content='posts', content_rowid='id')
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TRIGGER IF NOT EXISTS posts_fts_insert AFTER INSERT ON posts BEGIN
                INSERT INTO posts_fts(rowid, title, content)
                VALUES (new.id, new.title, new.content);
            END
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TRIGGER IF NOT EXISTS posts_fts_delete AFTER DELETE ON posts BEGIN
                INSERT INTO posts_fts(posts_fts, rowid, title, content)
                VALUES ('delete', old.id, old.title, old.content);
            END
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TRIGGER IF NOT EXISTS posts_fts_update AFTER UPDATE OF title, content ON posts BEGIN
                INSERT INTO posts_fts(posts_fts, rowid, title, content)
                VALUES ('delete', old.id, old.title, old.content);
                INSERT INTO posts_fts(rowid, title, content)
                VALUES (new.id, new.title, new.content);
            END
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a new post.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the category does not exist or is
    /// disabled, or an error if the database operation fails.
    pub async fn create(&self, post: &mut Post) -> Result<()> {
        let category = sqlx::query("SELECT 1 FROM categories WHERE id = ? AND is_active = 1")
            .bind(post.category_id.0)
            .fetch_optional(&self.pool)
            .await?;
        if category.is_none() {
            return Err(Error::NotFound("category", post.category_id.0));
        }

        let job_json = post.job.as_ref().map(serde_json::to_string).transpose()?;
        let house_json = post.house.as_ref().map(serde_json::to_string).transpose()?;
        let contact_json = post
            .contact
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let images_json = serde_json::to_string(&post.images)?;

        let result = sqlx::query(
            r"
            INSERT INTO posts (
                title, content, kind, category_id, price,
                job_json, house_json, images_json,
                longitude, latitude, address, city, district,
                contact_json, author_id, status, expires_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.kind.as_str())
        .bind(post.category_id.0)
        .bind(post.price)
        .bind(&job_json)
        .bind(&house_json)
        .bind(&images_json)
        .bind(post.location.point.longitude)
        .bind(post.location.point.latitude)
        .bind(&post.location.address)
        .bind(&post.location.city)
        .bind(&post.location.district)
        .bind(&contact_json)
        .bind(post.author.0)
        .bind(post.status.as_str())
        .bind(post.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        post.id = Some(PostId::new(result.last_insert_rowid()));
        debug!("stored post {} ({})", post.title, result.last_insert_rowid());
        Ok(())
    }

    /// Get post by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: PostId) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("{POST_COLUMNS} FROM posts WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().and_then(row_to_post))
    }

    /// Get post by ID with author/category display fields, counting the
    /// view.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_detail(&self, id: PostId) -> Result<Option<PostDetail>> {
        let updated = sqlx::query("UPDATE posts SET views = views + 1 WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query(&format!(
            r"
            {POST_COLUMNS},
                   u.username AS author_username, u.avatar AS author_avatar,
                   c.name AS category_name
            FROM posts
            JOIN users u ON u.id = posts.author_id
            LEFT JOIN categories c ON c.id = posts.category_id
            WHERE posts.id = ?
            "
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().and_then(|row| {
            Some(PostDetail {
                post: row_to_post(row)?,
                author_username: row.get("author_username"),
                author_avatar: row.get("author_avatar"),
                category_name: row.get("category_name"),
            })
        }))
    }

    /// Update a post's editable fields, author-scoped.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the post does not exist or belongs
    /// to someone else, or an error if the database operation fails.
    pub async fn update(&self, id: PostId, author: UserId, update: &PostUpdate) -> Result<Post> {
        let images_json = update
            .images
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let contact_json = update
            .contact
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            r"
            UPDATE posts SET
                title = COALESCE(?, title),
                content = COALESCE(?, content),
                price = COALESCE(?, price),
                images_json = COALESCE(?, images_json),
                contact_json = COALESCE(?, contact_json),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND author_id = ?
            ",
        )
        .bind(&update.title)
        .bind(&update.content)
        .bind(update.price)
        .bind(&images_json)
        .bind(&contact_json)
        .bind(id.0)
        .bind(author.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("post", id.0));
        }

        self.get(id).await?.ok_or(Error::NotFound("post", id.0))
    }

    /// Close a post, author-scoped (soft delete).
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the post does not exist or belongs
    /// to someone else, or an error if the database operation fails.
    pub async fn close(&self, id: PostId, author: UserId) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE posts SET status = 'closed', updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND author_id = ?
            ",
        )
        .bind(id.0)
        .bind(author.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("post", id.0));
        }
        Ok(())
    }

    /// Force a status, recording the review trail.
    ///
    /// `reviewer` is `None` when the automated screen decided.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown post, or an error if the
    /// database operation fails.
    pub async fn review(
        &self,
        id: PostId,
        status: PostStatus,
        reason: Option<&str>,
        reviewer: Option<UserId>,
    ) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE posts SET
                status = ?,
                review_reason = ?,
                reviewed_at = ?,
                reviewer_id = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            ",
        )
        .bind(status.as_str())
        .bind(reason)
        .bind(Utc::now().to_rfc3339())
        .bind(reviewer.map(|r| r.0))
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("post", id.0));
        }
        Ok(())
    }

    /// Force a status without touching the review trail.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown post, or an error if the
    /// database operation fails.
    pub async fn set_status(&self, id: PostId, status: PostStatus) -> Result<()> {
        let result =
            sqlx::query("UPDATE posts SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
                .bind(status.as_str())
                .bind(id.0)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("post", id.0));
        }
        Ok(())
    }

    /// List posts, newest first.
    ///
    /// A `None` status in the filter matches every status (moderation
    /// views); public listings should pass `Some(PostStatus::Active)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: &PostFilter, page: PageRequest) -> Result<Page<Post>> {
        let mut query = sqlx::QueryBuilder::new(format!("{POST_COLUMNS} FROM posts WHERE 1 = 1"));
        push_post_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query.build().fetch_all(&self.pool).await?;
        let posts = rows.iter().filter_map(row_to_post).collect();

        let mut count = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM posts WHERE 1 = 1");
        push_post_filters(&mut count, filter);
        let total: i64 = count.build().fetch_one(&self.pool).await?.get(0);

        #[allow(clippy::cast_sign_loss)]
        Ok(Page::new(posts, page, total as u64))
    }

    /// Bump the view counter by one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn increment_views(&self, id: PostId) -> Result<()> {
        sqlx::query("UPDATE posts SET views = views + 1 WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Adjust the favorite counter, clamping at zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn adjust_favorites(&self, id: PostId, delta: i64) -> Result<()> {
        sqlx::query("UPDATE posts SET favorites = MAX(0, favorites + ?) WHERE id = ?")
            .bind(delta)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Soft-delete every post of one author. Returns the affected count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn soft_delete_by_author(&self, author: UserId) -> Result<u64> {
        let result = sqlx::query(
            r"
            UPDATE posts SET status = 'deleted', updated_at = CURRENT_TIMESTAMP
            WHERE author_id = ?
            ",
        )
        .bind(author.0)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Count all posts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<u64> {
        let total: i64 = sqlx::query("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?
            .get(0);
        #[allow(clippy::cast_sign_loss)]
        Ok(total as u64)
    }

    /// Count posts in one status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_with_status(&self, status: PostStatus) -> Result<u64> {
        let total: i64 = sqlx::query("SELECT COUNT(*) FROM posts WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?
            .get(0);
        #[allow(clippy::cast_sign_loss)]
        Ok(total as u64)
    }

    /// Count posts created at or after the given instant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_created_since(&self, since: DateTime<Utc>) -> Result<u64> {
        let total: i64 = sqlx::query("SELECT COUNT(*) FROM posts WHERE created_at >= ?")
            .bind(since.format("%Y-%m-%d %H:%M:%S").to_string())
            .fetch_one(&self.pool)
            .await?
            .get(0);
        #[allow(clippy::cast_sign_loss)]
        Ok(total as u64)
    }
}

const POST_COLUMNS: &str = r"
    SELECT posts.id, posts.title, posts.content, posts.kind, posts.category_id, posts.price,
           posts.job_json, posts.house_json, posts.images_json,
           posts.longitude, posts.latitude, posts.address, posts.city, posts.district,
           posts.contact_json, posts.author_id, posts.views, posts.favorites, posts.status,
           posts.review_reason, posts.reviewed_at, posts.reviewer_id,
           posts.created_at, posts.updated_at, posts.expires_at";

fn push_post_filters(query: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>, filter: &PostFilter) {
    if let Some(kind) = filter.kind {
        query.push(" AND kind = ").push_bind(kind.as_str());
    }
    if let Some(category_id) = filter.category_id {
        query.push(" AND category_id = ").push_bind(category_id.0);
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(author) = filter.author {
        query.push(" AND author_id = ").push_bind(author.0);
    }
    if let Some(keyword) = &filter.keyword {
        let pattern = format!("%{keyword}%");
        query
            .push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR content LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Convert a database row to a Post.
///
/// Rows with an unparseable expiry timestamp are skipped, as are rows
/// whose JSON columns were corrupted out-of-band.
pub(crate) fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Option<Post> {
    let expires_at = DateTime::parse_from_rfc3339(&row.get::<String, _>("expires_at"))
        .ok()?
        .with_timezone(&Utc);
    let reviewed_at = row
        .get::<Option<String>, _>("reviewed_at")
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc));

    let job: Option<JobDetails> = row
        .get::<Option<String>, _>("job_json")
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok());
    let house: Option<HouseDetails> = row
        .get::<Option<String>, _>("house_json")
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok());
    let contact: Option<Contact> = row
        .get::<Option<String>, _>("contact_json")
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok());
    let images: Vec<String> =
        serde_json::from_str(&row.get::<String, _>("images_json")).unwrap_or_default();

    Some(Post {
        id: Some(PostId::new(row.get("id"))),
        title: row.get("title"),
        content: row.get("content"),
        kind: PostKind::parse(row.get("kind")),
        category_id: CategoryId::new(row.get("category_id")),
        price: row.get("price"),
        job,
        house,
        images,
        location: Location {
            point: GeoPoint::new(row.get("longitude"), row.get("latitude")),
            address: row.get("address"),
            city: row.get("city"),
            district: row.get("district"),
        },
        contact,
        author: UserId::new(row.get("author_id")),
        views: row.get("views"),
        favorites: row.get("favorites"),
        status: PostStatus::parse(row.get("status")),
        review_reason: row.get("review_reason"),
        reviewed_at,
        reviewer: row.get::<Option<i64>, _>("reviewer_id").map(UserId::new),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        expires_at,
    })
}
