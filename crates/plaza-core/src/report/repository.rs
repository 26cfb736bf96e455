//! Report storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqlitePool;

use super::model::{Report, ReportId, ReportKind, ReportStatus};
use crate::db::Database;
use crate::pagination::{Page, PageRequest};
use crate::post::PostId;
use crate::user::UserId;
use crate::{Error, Result};

/// Repository for report storage and retrieval.
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
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
            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                reporter_id INTEGER NOT NULL,
                post_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                description TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                result TEXT,
                processed_at TEXT,
                processor_id INTEGER,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_reports_status_created
            ON reports(status, created_at DESC)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_reports_post_reporter
            ON reports(post_id, reporter_id)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// File a report.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown post, `Error::Conflict`
    /// when the reporter already has a pending report on the same post,
    /// or an error if the database operation fails.
    pub async fn create(&self, report: &mut Report) -> Result<()> {
        let post = sqlx::query("SELECT 1 FROM posts WHERE id = ?")
            .bind(report.post.0)
            .fetch_optional(&self.pool)
            .await?;
        if post.is_none() {
            return Err(Error::NotFound("post", report.post.0));
        }

        let duplicate = sqlx::query(
            r"
            SELECT 1 FROM reports
            WHERE reporter_id = ? AND post_id = ? AND status = 'pending'
            ",
        )
        .bind(report.reporter.0)
        .bind(report.post.0)
        .fetch_optional(&self.pool)
        .await?;
        if duplicate.is_some() {
            return Err(Error::Conflict(
                "post already reported by this user".to_string(),
            ));
        }

        let result = sqlx::query(
            r"
            INSERT INTO reports (reporter_id, post_id, kind, description, status)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(report.reporter.0)
        .bind(report.post.0)
        .bind(report.kind.as_str())
        .bind(&report.description)
        .bind(report.status.as_str())
        .execute(&self.pool)
        .await?;

        report.id = Some(ReportId::new(result.last_insert_rowid()));
        Ok(())
    }

    /// Get report by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: ReportId) -> Result<Option<Report>> {
        let row = sqlx::query(
            r"
            SELECT id, reporter_id, post_id, kind, description, status,
                   result, processed_at, processor_id, created_at
            FROM reports
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_report))
    }

    /// List reports, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        status: Option<ReportStatus>,
        page: PageRequest,
    ) -> Result<Page<Report>> {
        let mut query = sqlx::QueryBuilder::new(
            r"
            SELECT id, reporter_id, post_id, kind, description, status,
                   result, processed_at, processor_id, created_at
            FROM reports
            WHERE 1 = 1
            ",
        );
        if let Some(status) = status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query.build().fetch_all(&self.pool).await?;
        let reports = rows.iter().map(row_to_report).collect();

        let mut count = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM reports WHERE 1 = 1");
        if let Some(status) = status {
            count.push(" AND status = ").push_bind(status.as_str());
        }
        let total: i64 = count.build().fetch_one(&self.pool).await?.get(0);

        #[allow(clippy::cast_sign_loss)]
        Ok(Page::new(reports, page, total as u64))
    }

    /// Mark a report processed with the moderator's resolution.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown report,
    /// `Error::InvalidState` when it was already processed, or an error
    /// if the database operation fails.
    pub async fn process(&self, id: ReportId, result: &str, processor: UserId) -> Result<Report> {
        let report = self.get(id).await?.ok_or(Error::NotFound("report", id.0))?;
        if !report.is_pending() {
            return Err(Error::InvalidState(
                "report was already processed".to_string(),
            ));
        }

        sqlx::query(
            r"
            UPDATE reports SET
                status = 'processed',
                result = ?,
                processed_at = ?,
                processor_id = ?
            WHERE id = ?
            ",
        )
        .bind(result)
        .bind(Utc::now().to_rfc3339())
        .bind(processor.0)
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        self.get(id).await?.ok_or(Error::NotFound("report", id.0))
    }
}

fn row_to_report(row: &sqlx::sqlite::SqliteRow) -> Report {
    let processed_at = row
        .get::<Option<String>, _>("processed_at")
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc));

    Report {
        id: Some(ReportId::new(row.get("id"))),
        reporter: UserId::new(row.get("reporter_id")),
        post: PostId::new(row.get("post_id")),
        kind: ReportKind::parse(row.get("kind")),
        description: row.get("description"),
        status: ReportStatus::parse(row.get("status")),
        result: row.get("result"),
        processed_at,
        processor: row.get::<Option<i64>, _>("processor_id").map(UserId::new),
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

    async fn setup() -> (ReportRepository, PostId, UserId) {
        let db = Database::in_memory().await.unwrap();

        let users = UserRepository::new(&db).await.unwrap();
        let mut user = User::new("sam_42", "sam@example.com");
        users.create(&mut user, "abc123").await.unwrap();

        let categories = CategoryRepository::new(&db).await.unwrap();
        let mut category = Category::new("Furniture", PostKind::SecondHand);
        categories.save(&mut category).await.unwrap();

        let posts = PostRepository::new(&db).await.unwrap();
        let mut post = Post::new(
            "Too good to be true",
            "Wire the deposit first",
            PostKind::SecondHand,
            category.id.unwrap(),
            user.id.unwrap(),
            Location::at(GeoPoint::new(116.40, 39.90)),
        )
        .with_price(1.0);
        posts.create(&mut post).await.unwrap();

        let reports = ReportRepository::new(&db).await.unwrap();
        (reports, post.id.unwrap(), user.id.unwrap())
    }

    #[tokio::test]
    async fn test_file_and_list() {
        let (reports, post, reporter) = setup().await;

        let mut report = Report::new(reporter, post, ReportKind::Fraud, "deposit scam");
        reports.create(&mut report).await.unwrap();

        let page = reports
            .list(Some(ReportStatus::Pending), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].kind, ReportKind::Fraud);
    }

    #[tokio::test]
    async fn test_duplicate_pending_report_conflicts() {
        let (reports, post, reporter) = setup().await;

        let mut first = Report::new(reporter, post, ReportKind::Fraud, "deposit scam");
        reports.create(&mut first).await.unwrap();

        let mut second = Report::new(reporter, post, ReportKind::Spam, "same post again");
        let err = reports.create(&mut second).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_process_once() {
        let (reports, post, reporter) = setup().await;

        let mut report = Report::new(reporter, post, ReportKind::Fraud, "deposit scam");
        reports.create(&mut report).await.unwrap();
        let id = report.id.unwrap();

        let processed = reports
            .process(id, "post taken down", UserId::new(7))
            .await
            .unwrap();
        assert_eq!(processed.status, ReportStatus::Processed);
        assert_eq!(processed.processor, Some(UserId::new(7)));
        assert!(processed.processed_at.is_some());

        let err = reports
            .process(id, "again", UserId::new(7))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_processed_report_allows_new_one() {
        let (reports, post, reporter) = setup().await;

        let mut first = Report::new(reporter, post, ReportKind::Fraud, "deposit scam");
        reports.create(&mut first).await.unwrap();
        reports
            .process(first.id.unwrap(), "warned author", UserId::new(7))
            .await
            .unwrap();

        let mut second = Report::new(reporter, post, ReportKind::Fraud, "still at it");
        reports.create(&mut second).await.unwrap();
        assert!(second.id.is_some());
    }
}
