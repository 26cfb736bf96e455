//! Admin service implementation.

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::pagination::{Page, PageRequest};
use crate::post::{Post, PostFilter, PostId, PostRepository, PostStatus};
use crate::report::{Report, ReportId, ReportRepository, ReportStatus};
use crate::user::{User, UserFilter, UserId, UserRepository, UserStatus};
use crate::{Error, Result};

/// Daily totals shown on the moderation dashboard.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Statistics {
    /// All registered members (admins excluded).
    pub total_users: u64,
    /// Members registered since midnight UTC.
    pub users_today: u64,
    /// All posts, any status.
    pub total_posts: u64,
    /// Posts waiting for the publication screen or a moderator.
    pub pending_posts: u64,
    /// Posts created since midnight UTC.
    pub posts_today: u64,
}

/// Service for moderator/back-office operations.
///
/// Callers are responsible for checking that the acting user is an
/// administrator; this service enforces only the rules about what may
/// be done to whom (admin accounts are untouchable).
pub struct AdminService {
    users: UserRepository,
    posts: PostRepository,
    reports: ReportRepository,
}

impl AdminService {
    /// Create a service over the given repositories.
    #[must_use]
    pub const fn new(
        users: UserRepository,
        posts: PostRepository,
        reports: ReportRepository,
    ) -> Self {
        Self {
            users,
            posts,
            reports,
        }
    }

    /// List non-admin members.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_members(&self, filter: &UserFilter, page: PageRequest) -> Result<Page<User>> {
        self.users.list_members(filter, page).await
    }

    /// Ban a member.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` for an unknown user, `Error::Forbidden` for an
    /// admin account, or an error if the database operation fails.
    pub async fn ban_user(&self, id: UserId) -> Result<()> {
        self.ensure_member(id).await?;
        self.users.set_status(id, UserStatus::Banned).await?;
        info!("banned user {id}");
        Ok(())
    }

    /// Lift a member's ban.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` for an unknown user, `Error::Forbidden` for an
    /// admin account, or an error if the database operation fails.
    pub async fn unban_user(&self, id: UserId) -> Result<()> {
        self.ensure_member(id).await?;
        self.users.set_status(id, UserStatus::Active).await
    }

    /// Delete a member and soft-delete all their posts.
    ///
    /// Two coupled writes with no transaction around them.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` for an unknown user, `Error::Forbidden` for an
    /// admin account, or an error if a database operation fails.
    pub async fn delete_user(&self, id: UserId) -> Result<()> {
        self.ensure_member(id).await?;
        self.users.delete(id).await?;
        let hidden = self.posts.soft_delete_by_author(id).await?;
        info!("deleted user {id} and hid {hidden} posts");
        Ok(())
    }

    /// Reset a member's password.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` for an unknown user, `Error::Forbidden` for an
    /// admin account, or an error if the database operation fails.
    pub async fn reset_user_password(&self, id: UserId, new_password: &str) -> Result<()> {
        self.ensure_member(id).await?;
        self.users.reset_password(id, new_password).await
    }

    /// List posts across every status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_posts(&self, filter: &PostFilter, page: PageRequest) -> Result<Page<Post>> {
        self.posts.list(filter, page).await
    }

    /// Review a post by hand, recording the moderator.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown post, or an error if the
    /// database operation fails.
    pub async fn review_post(
        &self,
        id: PostId,
        status: PostStatus,
        reason: Option<&str>,
        reviewer: UserId,
    ) -> Result<()> {
        self.posts.review(id, status, reason, Some(reviewer)).await
    }

    /// Take a post down (soft delete).
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown post, or an error if the
    /// database operation fails.
    pub async fn delete_post(&self, id: PostId) -> Result<()> {
        self.posts.set_status(id, PostStatus::Deleted).await
    }

    /// List reports, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        page: PageRequest,
    ) -> Result<Page<Report>> {
        self.reports.list(status, page).await
    }

    /// Resolve a report, optionally applying a status to the reported
    /// post (e.g. taking it down).
    ///
    /// # Errors
    ///
    /// `Error::NotFound` for an unknown report, `Error::InvalidState`
    /// when it was already processed, or an error if a database
    /// operation fails.
    pub async fn process_report(
        &self,
        id: ReportId,
        result: &str,
        processor: UserId,
        post_action: Option<PostStatus>,
    ) -> Result<Report> {
        let report = self.reports.process(id, result, processor).await?;

        if let Some(action) = post_action {
            self.posts.set_status(report.post, action).await?;
        }
        Ok(report)
    }

    /// Dashboard totals. "Today" is the midnight UTC boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn statistics(&self) -> Result<Statistics> {
        let midnight = today_start();

        Ok(Statistics {
            total_users: self.users.count_members().await?,
            users_today: self.users.count_members_since(midnight).await?,
            total_posts: self.posts.count().await?,
            pending_posts: self.posts.count_with_status(PostStatus::Pending).await?,
            posts_today: self.posts.count_created_since(midnight).await?,
        })
    }

    async fn ensure_member(&self, id: UserId) -> Result<User> {
        let user = self
            .users
            .get(id)
            .await?
            .ok_or(Error::NotFound("user", id.0))?;
        if user.is_admin() {
            return Err(Error::Forbidden(
                "administrator accounts are untouchable".to_string(),
            ));
        }
        Ok(user)
    }
}

fn today_start() -> DateTime<Utc> {
    Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::category::{Category, CategoryId, CategoryRepository};
    use crate::db::Database;
    use crate::post::{GeoPoint, Location, PostKind};
    use crate::report::ReportKind;
    use crate::user::UserRole;

    struct Fixture {
        service: AdminService,
        posts: PostRepository,
        users: UserRepository,
        reports: ReportRepository,
        category: CategoryId,
        member: UserId,
        admin: UserId,
    }

    async fn setup() -> Fixture {
        let db = Database::in_memory().await.unwrap();

        let users = UserRepository::new(&db).await.unwrap();
        let mut member = User::new("sam_42", "sam@example.com");
        users.create(&mut member, "abc123").await.unwrap();
        let mut admin = User::new("the_admin", "admin@example.com");
        admin.role = UserRole::Admin;
        users.create(&mut admin, "abc123").await.unwrap();

        let categories = CategoryRepository::new(&db).await.unwrap();
        let mut category = Category::new("Furniture", PostKind::SecondHand);
        categories.save(&mut category).await.unwrap();

        let service = AdminService::new(
            UserRepository::new(&db).await.unwrap(),
            PostRepository::new(&db).await.unwrap(),
            ReportRepository::new(&db).await.unwrap(),
        );

        Fixture {
            service,
            posts: PostRepository::new(&db).await.unwrap(),
            users,
            reports: ReportRepository::new(&db).await.unwrap(),
            category: category.id.unwrap(),
            member: member.id.unwrap(),
            admin: admin.id.unwrap(),
        }
    }

    async fn member_post(f: &Fixture) -> PostId {
        let mut post = Post::new(
            "Bike for sale",
            "Barely used",
            PostKind::SecondHand,
            f.category,
            f.member,
            Location::at(GeoPoint::new(116.40, 39.90)),
        )
        .with_price(120.0);
        f.posts.create(&mut post).await.unwrap();
        post.id.unwrap()
    }

    #[tokio::test]
    async fn test_ban_and_unban_member() {
        let f = setup().await;

        f.service.ban_user(f.member).await.unwrap();
        assert_eq!(
            f.users.get(f.member).await.unwrap().unwrap().status,
            UserStatus::Banned
        );

        f.service.unban_user(f.member).await.unwrap();
        assert_eq!(
            f.users.get(f.member).await.unwrap().unwrap().status,
            UserStatus::Active
        );
    }

    #[tokio::test]
    async fn test_admin_accounts_are_untouchable() {
        let f = setup().await;

        assert!(matches!(
            f.service.ban_user(f.admin).await.unwrap_err(),
            Error::Forbidden(_)
        ));
        assert!(matches!(
            f.service.delete_user(f.admin).await.unwrap_err(),
            Error::Forbidden(_)
        ));
        assert!(matches!(
            f.service
                .reset_user_password(f.admin, "xyz789")
                .await
                .unwrap_err(),
            Error::Forbidden(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_user_hides_their_posts() {
        let f = setup().await;
        let post = member_post(&f).await;

        f.service.delete_user(f.member).await.unwrap();

        assert!(f.users.get(f.member).await.unwrap().is_none());
        assert_eq!(
            f.posts.get(post).await.unwrap().unwrap().status,
            PostStatus::Deleted
        );
    }

    #[tokio::test]
    async fn test_review_post_records_moderator() {
        let f = setup().await;
        let post = member_post(&f).await;

        f.service
            .review_post(post, PostStatus::Active, None, f.admin)
            .await
            .unwrap();

        let reviewed = f.posts.get(post).await.unwrap().unwrap();
        assert_eq!(reviewed.status, PostStatus::Active);
        assert_eq!(reviewed.reviewer, Some(f.admin));
    }

    #[tokio::test]
    async fn test_process_report_can_take_post_down() {
        let f = setup().await;
        let post = member_post(&f).await;

        let mut report = Report::new(f.member, post, ReportKind::Fraud, "deposit scam");
        f.reports.create(&mut report).await.unwrap();

        f.service
            .process_report(
                report.id.unwrap(),
                "confirmed, post removed",
                f.admin,
                Some(PostStatus::Deleted),
            )
            .await
            .unwrap();

        assert_eq!(
            f.posts.get(post).await.unwrap().unwrap().status,
            PostStatus::Deleted
        );

        let listed = f
            .service
            .list_reports(Some(ReportStatus::Processed), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(listed.total, 1);
    }

    #[tokio::test]
    async fn test_statistics() {
        let f = setup().await;
        member_post(&f).await;

        let stats = f.service.statistics().await.unwrap();
        assert_eq!(stats.total_users, 1); // admin excluded
        assert_eq!(stats.users_today, 1);
        assert_eq!(stats.total_posts, 1);
        assert_eq!(stats.pending_posts, 1);
        assert_eq!(stats.posts_today, 1);
    }
}
