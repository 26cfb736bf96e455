//! Comment service.
//!
//! Creates comments and fans out the notifications to the post author
//! and, for replies, the parent comment's author.

use super::model::{Comment, CommentId};
use super::repository::CommentRepository;
use crate::notification::NotificationService;
use crate::post::{PostId, PostRepository};
use crate::user::UserId;
use crate::{Error, Result};

/// Service for posting comments with notification fan-out.
pub struct CommentService {
    comments: CommentRepository,
    posts: PostRepository,
    notifications: NotificationService,
}

impl CommentService {
    /// Create a service over the given repositories.
    #[must_use]
    pub const fn new(
        comments: CommentRepository,
        posts: PostRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            comments,
            posts,
            notifications,
        }
    }

    /// The underlying comment repository, for read-side operations.
    #[must_use]
    pub const fn comments(&self) -> &CommentRepository {
        &self.comments
    }

    /// Post a comment, notifying the post author and (for replies) the
    /// parent comment's author. Nobody is notified about their own
    /// comment.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the post or parent comment does
    /// not exist, or an error if a database operation fails.
    pub async fn post_comment(
        &self,
        content: &str,
        author: UserId,
        post_id: PostId,
        parent: Option<CommentId>,
    ) -> Result<Comment> {
        let post = self
            .posts
            .get(post_id)
            .await?
            .ok_or(Error::NotFound("post", post_id.0))?;

        let parent_comment = match parent {
            Some(parent_id) => Some(
                self.comments
                    .get(parent_id)
                    .await?
                    .ok_or(Error::NotFound("comment", parent_id.0))?,
            ),
            None => None,
        };

        let mut comment = Comment::new(content, author, post_id);
        if let Some(parent_id) = parent {
            comment = comment.replying_to(parent_id);
        }
        self.comments.create(&mut comment).await?;

        if post.author != author {
            self.notifications
                .notify_comment(
                    post.author,
                    author,
                    "New comment",
                    &format!("Someone commented on your post: {content}"),
                    Some(post_id.0),
                )
                .await?;
        }

        if let Some(parent_comment) = parent_comment
            && parent_comment.author != author
        {
            self.notifications
                .notify_comment(
                    parent_comment.author,
                    author,
                    "New reply",
                    &format!("Someone replied to your comment: {content}"),
                    Some(post_id.0),
                )
                .await?;
        }

        Ok(comment)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::category::{Category, CategoryRepository};
    use crate::db::Database;
    use crate::notification::NotificationRepository;
    use crate::pagination::PageRequest;
    use crate::post::{GeoPoint, Location, Post, PostKind};
    use crate::user::{User, UserRepository};

    struct Fixture {
        service: CommentService,
        notifications: NotificationRepository,
        post: PostId,
        author: UserId,
        commenter: UserId,
    }

    async fn setup() -> Fixture {
        let db = Database::in_memory().await.unwrap();

        let users = UserRepository::new(&db).await.unwrap();
        let mut author = User::new("alice_1", "alice@example.com");
        users.create(&mut author, "abc123").await.unwrap();
        let mut commenter = User::new("bob_22", "bob@example.com");
        users.create(&mut commenter, "abc123").await.unwrap();

        let categories = CategoryRepository::new(&db).await.unwrap();
        let mut category = Category::new("Services", PostKind::Service);
        categories.save(&mut category).await.unwrap();

        let posts = PostRepository::new(&db).await.unwrap();
        let mut post = Post::new(
            "Dog walking",
            "Weekday afternoons",
            PostKind::Service,
            category.id.unwrap(),
            author.id.unwrap(),
            Location::at(GeoPoint::new(116.40, 39.90)),
        );
        posts.create(&mut post).await.unwrap();

        let service = CommentService::new(
            CommentRepository::new(&db).await.unwrap(),
            posts,
            NotificationService::new(NotificationRepository::new(&db).await.unwrap()),
        );

        Fixture {
            service,
            notifications: NotificationRepository::new(&db).await.unwrap(),
            post: post.id.unwrap(),
            author: author.id.unwrap(),
            commenter: commenter.id.unwrap(),
        }
    }

    #[tokio::test]
    async fn test_comment_notifies_post_author() {
        let f = setup().await;

        f.service
            .post_comment("How much per walk?", f.commenter, f.post, None)
            .await
            .unwrap();

        let inbox = f
            .notifications
            .list(f.author, None, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(inbox.total, 1);
        assert_eq!(inbox.items[0].notification.sender, Some(f.commenter));
    }

    #[tokio::test]
    async fn test_own_comment_is_silent() {
        let f = setup().await;

        f.service
            .post_comment("Bump", f.author, f.post, None)
            .await
            .unwrap();

        let inbox = f
            .notifications
            .list(f.author, None, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(inbox.total, 0);
    }

    #[tokio::test]
    async fn test_reply_notifies_parent_author_too() {
        let f = setup().await;

        let parent = f
            .service
            .post_comment("How much per walk?", f.commenter, f.post, None)
            .await
            .unwrap();

        f.service
            .post_comment("Fifteen an hour", f.author, f.post, parent.id)
            .await
            .unwrap();

        // The commenter hears about the reply; the post author gets
        // nothing for their own comment.
        let inbox = f
            .notifications
            .list(f.commenter, None, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(inbox.total, 1);
        assert!(inbox.items[0].notification.content.contains("replied"));
    }

    #[tokio::test]
    async fn test_reply_to_missing_parent() {
        let f = setup().await;

        let err = f
            .service
            .post_comment("hello", f.commenter, f.post, Some(CommentId::new(404)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound("comment", 404)));
    }
}
