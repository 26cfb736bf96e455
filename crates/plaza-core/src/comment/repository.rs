//! Comment storage repository.

use sqlx::Row;
use sqlx::sqlite::SqlitePool;

use super::model::{Comment, CommentId, CommentStatus, CommentView};
use crate::db::Database;
use crate::pagination::{Page, PageRequest};
use crate::post::PostId;
use crate::user::UserId;
use crate::{Error, Result};

/// Repository for comment storage and retrieval.
pub struct CommentRepository {
    pool: SqlitePool,
}

impl CommentRepository {
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
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL,
                author_id INTEGER NOT NULL,
                post_id INTEGER NOT NULL,
                parent_id INTEGER,
                status TEXT NOT NULL DEFAULT 'active',
                likes INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_comments_post_created
            ON comments(post_id, created_at DESC)
            ",
        )
        .execute(&self.pool)
        .await?;

        // One like per user per comment.
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS comment_likes (
                comment_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(comment_id, user_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a comment.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the post does not exist, or an
    /// error if the database operation fails.
    pub async fn create(&self, comment: &mut Comment) -> Result<()> {
        let post = sqlx::query("SELECT 1 FROM posts WHERE id = ?")
            .bind(comment.post.0)
            .fetch_optional(&self.pool)
            .await?;
        if post.is_none() {
            return Err(Error::NotFound("post", comment.post.0));
        }

        let result = sqlx::query(
            r"
            INSERT INTO comments (content, author_id, post_id, parent_id, status)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(&comment.content)
        .bind(comment.author.0)
        .bind(comment.post.0)
        .bind(comment.parent.map(|p| p.0))
        .bind(comment.status.as_str())
        .execute(&self.pool)
        .await?;

        comment.id = Some(CommentId::new(result.last_insert_rowid()));
        Ok(())
    }

    /// Get comment by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: CommentId) -> Result<Option<Comment>> {
        let row = sqlx::query(
            r"
            SELECT id, content, author_id, post_id, parent_id, status, likes, created_at
            FROM comments
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_comment))
    }

    /// List visible comments under a post, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_post(&self, post: PostId, page: PageRequest) -> Result<Page<CommentView>> {
        let rows = sqlx::query(
            r"
            SELECT c.id, c.content, c.author_id, c.post_id, c.parent_id, c.status, c.likes,
                   c.created_at, u.username AS author_username, u.avatar AS author_avatar
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = ? AND c.status = 'active'
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT ? OFFSET ?
            ",
        )
        .bind(post.0)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let views = rows
            .iter()
            .map(|row| CommentView {
                comment: row_to_comment(row),
                author_username: row.get("author_username"),
                author_avatar: row.get("author_avatar"),
            })
            .collect();

        let total: i64 =
            sqlx::query("SELECT COUNT(*) FROM comments WHERE post_id = ? AND status = 'active'")
                .bind(post.0)
                .fetch_one(&self.pool)
                .await?
                .get(0);

        #[allow(clippy::cast_sign_loss)]
        Ok(Page::new(views, page, total as u64))
    }

    /// Soft-delete a comment, author-scoped.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the comment does not exist or
    /// belongs to someone else, or an error if the database operation
    /// fails.
    pub async fn soft_delete(&self, id: CommentId, author: UserId) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE comments SET status = 'deleted', updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND author_id = ?
            ",
        )
        .bind(id.0)
        .bind(author.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("comment", id.0));
        }
        Ok(())
    }

    /// Like a comment, once per user.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown comment,
    /// `Error::Conflict` when the user already liked it, or an error if
    /// the database operation fails.
    pub async fn like(&self, id: CommentId, user: UserId) -> Result<()> {
        let comment = sqlx::query("SELECT 1 FROM comments WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        if comment.is_none() {
            return Err(Error::NotFound("comment", id.0));
        }

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO comment_likes (comment_id, user_id) VALUES (?, ?)",
        )
        .bind(id.0)
        .bind(user.0)
        .execute(&self.pool)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(Error::Conflict("comment already liked".to_string()));
        }

        sqlx::query("UPDATE comments SET likes = likes + 1 WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn row_to_comment(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: Some(CommentId::new(row.get("id"))),
        content: row.get("content"),
        author: UserId::new(row.get("author_id")),
        post: PostId::new(row.get("post_id")),
        parent: row.get::<Option<i64>, _>("parent_id").map(CommentId::new),
        status: CommentStatus::parse(row.get("status")),
        likes: row.get("likes"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::category::{Category, CategoryRepository};
    use crate::post::{GeoPoint, Location, Post, PostKind, PostRepository};
    use crate::user::{User, UserRepository};

    async fn setup() -> (CommentRepository, PostId, UserId) {
        let db = Database::in_memory().await.unwrap();

        let users = UserRepository::new(&db).await.unwrap();
        let mut user = User::new("sam_42", "sam@example.com");
        users.create(&mut user, "abc123").await.unwrap();

        let categories = CategoryRepository::new(&db).await.unwrap();
        let mut category = Category::new("Services", PostKind::Service);
        categories.save(&mut category).await.unwrap();

        let posts = PostRepository::new(&db).await.unwrap();
        let mut post = Post::new(
            "Dog walking",
            "Weekday afternoons",
            PostKind::Service,
            category.id.unwrap(),
            user.id.unwrap(),
            Location::at(GeoPoint::new(116.40, 39.90)),
        );
        posts.create(&mut post).await.unwrap();

        let comments = CommentRepository::new(&db).await.unwrap();
        (comments, post.id.unwrap(), user.id.unwrap())
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (comments, post, author) = setup().await;

        let mut comment = Comment::new("How much per walk?", author, post);
        comments.create(&mut comment).await.unwrap();

        let page = comments
            .list_for_post(post, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].author_username, "sam_42");
    }

    #[tokio::test]
    async fn test_comment_on_missing_post() {
        let (comments, _post, author) = setup().await;

        let mut comment = Comment::new("hello", author, PostId::new(999));
        let err = comments.create(&mut comment).await.unwrap_err();
        assert!(matches!(err, Error::NotFound("post", 999)));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_listing() {
        let (comments, post, author) = setup().await;

        let mut comment = Comment::new("How much per walk?", author, post);
        comments.create(&mut comment).await.unwrap();
        let id = comment.id.unwrap();

        assert!(comments.soft_delete(id, UserId::new(999)).await.is_err());
        comments.soft_delete(id, author).await.unwrap();

        let page = comments
            .list_for_post(post, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);

        // The row survives for moderation purposes.
        let loaded = comments.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.status, CommentStatus::Deleted);
    }

    #[tokio::test]
    async fn test_like_once_per_user() {
        let (comments, post, author) = setup().await;

        let mut comment = Comment::new("How much per walk?", author, post);
        comments.create(&mut comment).await.unwrap();
        let id = comment.id.unwrap();

        comments.like(id, UserId::new(5)).await.unwrap();
        let err = comments.like(id, UserId::new(5)).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        comments.like(id, UserId::new(6)).await.unwrap();
        let loaded = comments.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.likes, 2);
    }
}
