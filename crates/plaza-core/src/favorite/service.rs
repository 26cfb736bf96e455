//! Favorite service.
//!
//! Couples the favorite relation with the post's favorite counter. The
//! two writes are separate statements; a crash between them can leave
//! the counter off by one.

use super::repository::FavoriteRepository;
use crate::Result;
use crate::post::{PostId, PostRepository};
use crate::user::UserId;

/// Service for favoriting posts.
pub struct FavoriteService {
    favorites: FavoriteRepository,
    posts: PostRepository,
}

impl FavoriteService {
    /// Create a service over the given repositories.
    #[must_use]
    pub const fn new(favorites: FavoriteRepository, posts: PostRepository) -> Self {
        Self { favorites, posts }
    }

    /// The underlying favorite repository, for read-side operations.
    #[must_use]
    pub const fn favorites(&self) -> &FavoriteRepository {
        &self.favorites
    }

    /// Favorite a post and bump its counter.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown post, `Error::Conflict`
    /// when already favorited, or an error if a database operation
    /// fails.
    pub async fn add(&self, user: UserId, post: PostId) -> Result<()> {
        self.favorites.insert(user, post).await?;
        self.posts.adjust_favorites(post, 1).await?;
        Ok(())
    }

    /// Remove a favorite and drop the counter.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the favorite does not exist, or an
    /// error if a database operation fails.
    pub async fn remove(&self, user: UserId, post: PostId) -> Result<()> {
        self.favorites.remove(user, post).await?;
        self.posts.adjust_favorites(post, -1).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::category::{Category, CategoryRepository};
    use crate::db::Database;
    use crate::post::{GeoPoint, Location, Post, PostKind};
    use crate::user::{User, UserRepository};
    use crate::{Error, Result as CoreResult};

    async fn setup() -> CoreResult<(FavoriteService, PostRepository, PostId, UserId)> {
        let db = Database::in_memory().await?;

        let users = UserRepository::new(&db).await?;
        let mut user = User::new("sam_42", "sam@example.com");
        users.create(&mut user, "abc123").await?;

        let categories = CategoryRepository::new(&db).await?;
        let mut category = Category::new("Furniture", PostKind::SecondHand);
        categories.save(&mut category).await?;

        let posts = PostRepository::new(&db).await?;
        let mut post = Post::new(
            "Bike for sale",
            "Barely used",
            PostKind::SecondHand,
            category.id.unwrap(),
            user.id.unwrap(),
            Location::at(GeoPoint::new(116.40, 39.90)),
        )
        .with_price(120.0);
        posts.create(&mut post).await?;

        let service = FavoriteService::new(
            FavoriteRepository::new(&db).await?,
            PostRepository::new(&db).await?,
        );
        Ok((service, posts, post.id.unwrap(), user.id.unwrap()))
    }

    #[tokio::test]
    async fn test_add_and_remove_keep_counter_in_step() {
        let (service, posts, post, user) = setup().await.unwrap();

        service.add(user, post).await.unwrap();
        assert_eq!(posts.get(post).await.unwrap().unwrap().favorites, 1);

        service.remove(user, post).await.unwrap();
        assert_eq!(posts.get(post).await.unwrap().unwrap().favorites, 0);
    }

    #[tokio::test]
    async fn test_duplicate_add_leaves_counter_alone() {
        let (service, posts, post, user) = setup().await.unwrap();

        service.add(user, post).await.unwrap();
        let err = service.add(user, post).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        assert_eq!(posts.get(post).await.unwrap().unwrap().favorites, 1);
    }
}
