//! Screening service implementation.

use plaza_audit::{AuditClient, Provider, Verdict};
use tracing::{debug, warn};

use crate::config::Config;
use crate::db::Database;
use crate::post::{Post, PostRepository, PostStatus};
use crate::{Error, Result};

/// Outcome of screening a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screening {
    /// The post went live.
    Approved,
    /// The classifier flagged the content.
    Rejected {
        /// The classifier's reasons.
        reasons: Vec<String>,
    },
}

/// Service gating publication on the content classifier.
#[derive(Debug)]
pub struct ScreeningService {
    audit: AuditClient,
    posts: PostRepository,
}

impl ScreeningService {
    /// Create a service over the given classifier client and post
    /// repository.
    #[must_use]
    pub const fn new(audit: AuditClient, posts: PostRepository) -> Self {
        Self { audit, posts }
    }

    /// Build a service from runtime configuration, talking to the
    /// default classifier provider.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when classifier credentials are missing,
    /// or an error if the post schema cannot be initialized.
    pub async fn from_config(config: &Config, db: &Database) -> Result<Self> {
        if !config.has_audit_credentials() {
            return Err(Error::Config(
                "classifier credentials are not configured".to_string(),
            ));
        }

        let audit = AuditClient::new(
            config.audit_api_key.as_str(),
            config.audit_secret_key.as_str(),
            Provider::default(),
        );
        Ok(Self::new(audit, PostRepository::new(db).await?))
    }

    /// Screen free-form text and images without touching any post.
    ///
    /// # Errors
    ///
    /// Returns an error if a classifier call fails.
    pub async fn screen(&self, text: &str, image_urls: &[String]) -> Result<Verdict> {
        let text_verdict = self.audit.censor_text(text).await?;
        let image_verdict = self.audit.censor_images(image_urls).await?;
        Ok(Verdict::merge([text_verdict, image_verdict]))
    }

    /// Store a post and run it through the publication screen.
    ///
    /// The post is created pending, then flipped to active or rejected
    /// according to the verdict. If the classifier cannot be reached the
    /// post stays pending and the error propagates.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for a missing category, an audit error
    /// when the classifier call fails, or an error if a database
    /// operation fails.
    pub async fn submit(&self, post: &mut Post) -> Result<Screening> {
        post.status = PostStatus::Pending;
        self.posts.create(post).await?;
        let id = post.id.ok_or(Error::NotFound("post", 0))?;

        let text = format!("{}\n{}", post.title, post.content);
        let verdict = match self.screen(&text, &post.images).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("screening unavailable, post {id} stays pending: {e}");
                return Err(e);
            }
        };

        if verdict.passed {
            self.posts.review(id, PostStatus::Active, None, None).await?;
            post.status = PostStatus::Active;
            debug!("post {id} passed screening");
            Ok(Screening::Approved)
        } else {
            let reason = verdict.reasons.join(", ");
            self.posts
                .review(id, PostStatus::Rejected, Some(&reason), None)
                .await?;
            post.status = PostStatus::Rejected;
            post.review_reason = Some(reason);
            debug!("post {id} rejected by screening");
            Ok(Screening::Rejected {
                reasons: verdict.reasons,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::category::{Category, CategoryId, CategoryRepository};
    use crate::db::Database;
    use crate::post::{GeoPoint, Location, PostKind};
    use crate::user::{User, UserId, UserRepository};
    use plaza_audit::Provider;

    async fn setup() -> (ScreeningService, PostRepository, CategoryId, UserId) {
        let db = Database::in_memory().await.unwrap();

        let users = UserRepository::new(&db).await.unwrap();
        let mut user = User::new("sam_42", "sam@example.com");
        users.create(&mut user, "abc123").await.unwrap();

        let categories = CategoryRepository::new(&db).await.unwrap();
        let mut category = Category::new("Furniture", PostKind::SecondHand);
        categories.save(&mut category).await.unwrap();

        // Nothing listens on the discard port; every classifier call
        // fails at the transport layer.
        let unreachable = Provider::with_base("stub", "http://127.0.0.1:9/").unwrap();
        let audit = AuditClient::new("key", "secret", unreachable);

        let service = ScreeningService::new(audit, PostRepository::new(&db).await.unwrap());
        let posts = PostRepository::new(&db).await.unwrap();
        (service, posts, category.id.unwrap(), user.id.unwrap())
    }

    #[tokio::test]
    async fn test_from_config_requires_credentials() {
        let db = Database::in_memory().await.unwrap();
        let err = ScreeningService::from_config(&crate::Config::default(), &db)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let configured = crate::Config {
            audit_api_key: "key".to_string(),
            audit_secret_key: "secret".to_string(),
            ..crate::Config::default()
        };
        assert!(ScreeningService::from_config(&configured, &db).await.is_ok());
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_post_pending() {
        let (service, posts, category, author) = setup().await;

        let mut post = Post::new(
            "Bike for sale",
            "Barely used",
            PostKind::SecondHand,
            category,
            author,
            Location::at(GeoPoint::new(116.40, 39.90)),
        )
        .with_price(120.0);

        let err = service.submit(&mut post).await.unwrap_err();
        assert!(matches!(err, Error::Audit(_)));

        // Stored, but never published.
        let stored = posts.get(post.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.status, PostStatus::Pending);
    }
}
