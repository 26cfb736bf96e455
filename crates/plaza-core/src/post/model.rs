//! Post model types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::category::CategoryId;
use crate::user::UserId;

/// Days until a freshly created post expires.
pub const POST_TTL_DAYS: i64 = 30;

/// Unique identifier for a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostId(pub i64);

impl PostId {
    /// Create a new post ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of classified a post is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostKind {
    /// Second-hand goods for sale.
    SecondHand,
    /// Job offers and job hunting.
    Job,
    /// Housing rentals.
    House,
    /// Local services.
    Service,
}

impl PostKind {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "job" => Self::Job,
            "house" => Self::House,
            "service" => Self::Service,
            _ => Self::SecondHand,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SecondHand => "second_hand",
            Self::Job => "job",
            Self::House => "house",
            Self::Service => "service",
        }
    }

    /// Whether posts of this kind must carry a price.
    #[must_use]
    pub const fn requires_price(&self) -> bool {
        matches!(self, Self::SecondHand | Self::House)
    }
}

/// Lifecycle state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PostStatus {
    /// Awaiting the publication screen.
    #[default]
    Pending,
    /// Publicly visible.
    Active,
    /// Rejected by screening or a moderator.
    Rejected,
    /// Closed by its author.
    Closed,
    /// Removed by a moderator.
    Deleted,
}

impl PostStatus {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "active" => Self::Active,
            "rejected" => Self::Rejected,
            "closed" => Self::Closed,
            "deleted" => Self::Deleted,
            _ => Self::Pending,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Rejected => "rejected",
            Self::Closed => "closed",
            Self::Deleted => "deleted",
        }
    }

    /// Check if posts in this state are publicly visible.
    #[must_use]
    pub const fn is_public(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Degrees east, -180 to 180.
    pub longitude: f64,
    /// Degrees north, -90 to 90.
    pub latitude: f64,
}

impl GeoPoint {
    /// Create a new point.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Check that both components are within WGS84 bounds.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-180.0..=180.0).contains(&self.longitude) && (-90.0..=90.0).contains(&self.latitude)
    }
}

/// Where a post is located.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Coordinates.
    pub point: GeoPoint,
    /// Street address.
    pub address: Option<String>,
    /// City name.
    pub city: Option<String>,
    /// District within the city.
    pub district: Option<String>,
}

impl Location {
    /// Create a location from bare coordinates.
    #[must_use]
    pub const fn at(point: GeoPoint) -> Self {
        Self {
            point,
            address: None,
            city: None,
            district: None,
        }
    }
}

/// Extra fields for job posts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobDetails {
    /// Salary range description.
    pub salary: Option<String>,
    /// Required experience.
    pub experience: Option<String>,
    /// Required education.
    pub education: Option<String>,
    /// Hiring company.
    pub company: Option<String>,
}

/// Extra fields for housing posts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HouseDetails {
    /// Floor area in square meters.
    pub area: Option<f64>,
    /// Room layout description.
    pub rooms: Option<String>,
    /// Floor within the building.
    pub floor: Option<String>,
    /// Decoration/furnishing state.
    pub decoration: Option<String>,
}

/// How to reach the author outside the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    /// Contact name.
    pub name: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// WeChat handle.
    pub wechat: Option<String>,
}

/// A classified post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier (None for unsaved posts).
    pub id: Option<PostId>,
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Kind of classified.
    pub kind: PostKind,
    /// Category within the kind.
    pub category_id: CategoryId,
    /// Asking price; required for second-hand and housing posts.
    pub price: Option<f64>,
    /// Job-specific fields.
    pub job: Option<JobDetails>,
    /// Housing-specific fields.
    pub house: Option<HouseDetails>,
    /// Image URLs.
    pub images: Vec<String>,
    /// Where the offer is located.
    pub location: Location,
    /// Off-platform contact details.
    pub contact: Option<Contact>,
    /// Author of the post.
    pub author: UserId,
    /// View counter.
    pub views: i64,
    /// Favorite counter.
    pub favorites: i64,
    /// Lifecycle state.
    pub status: PostStatus,
    /// Reason recorded by screening or a moderator on rejection.
    pub review_reason: Option<String>,
    /// When the post was last reviewed.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Moderator who reviewed the post, if a human did.
    pub reviewer: Option<UserId>,
    /// Creation timestamp.
    pub created_at: Option<String>,
    /// Last update timestamp.
    pub updated_at: Option<String>,
    /// When the post stops being shown.
    pub expires_at: DateTime<Utc>,
}

impl Post {
    /// Create a new pending post expiring [`POST_TTL_DAYS`] from now.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        kind: PostKind,
        category_id: CategoryId,
        author: UserId,
        location: Location,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            kind,
            category_id,
            price: None,
            job: None,
            house: None,
            images: Vec::new(),
            location,
            contact: None,
            author,
            views: 0,
            favorites: 0,
            status: PostStatus::Pending,
            review_reason: None,
            reviewed_at: None,
            reviewer: None,
            created_at: None,
            updated_at: None,
            expires_at: Utc::now() + Duration::days(POST_TTL_DAYS),
        }
    }

    /// Set the asking price.
    #[must_use]
    pub const fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Attach image URLs.
    #[must_use]
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Attach contact details.
    #[must_use]
    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }

    /// Check if the post is publicly visible.
    #[must_use]
    pub const fn is_public(&self) -> bool {
        self.status.is_public()
    }

    /// Check if the post has passed its expiry time.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// A post joined with display fields for its author and category.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    /// The post itself.
    pub post: Post,
    /// Author's username.
    pub author_username: String,
    /// Author's avatar URL.
    pub author_avatar: Option<String>,
    /// Category display name.
    pub category_name: Option<String>,
}

/// Compact post representation for favorite listings and feeds.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    /// Post identifier.
    pub id: PostId,
    /// Headline.
    pub title: String,
    /// Kind of classified.
    pub kind: PostKind,
    /// Asking price.
    pub price: Option<f64>,
    /// First image URL, if any.
    pub cover: Option<String>,
    /// Author's username.
    pub author_username: String,
    /// Creation timestamp.
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrip() {
        for kind in [
            PostKind::SecondHand,
            PostKind::Job,
            PostKind::House,
            PostKind::Service,
        ] {
            assert_eq!(PostKind::parse(kind.as_str()), kind);
        }
    }

    #[test]
    fn status_roundtrip() {
        for status in [
            PostStatus::Pending,
            PostStatus::Active,
            PostStatus::Rejected,
            PostStatus::Closed,
            PostStatus::Deleted,
        ] {
            assert_eq!(PostStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn price_requirement_by_kind() {
        assert!(PostKind::SecondHand.requires_price());
        assert!(PostKind::House.requires_price());
        assert!(!PostKind::Job.requires_price());
        assert!(!PostKind::Service.requires_price());
    }

    #[test]
    fn new_post_is_pending_and_unexpired() {
        let post = Post::new(
            "Bike for sale",
            "Barely used",
            PostKind::SecondHand,
            CategoryId::new(1),
            UserId::new(1),
            Location::at(GeoPoint::new(116.40, 39.90)),
        );
        assert_eq!(post.status, PostStatus::Pending);
        assert!(!post.is_public());
        assert!(!post.is_expired());
    }

    #[test]
    fn geo_point_bounds() {
        assert!(GeoPoint::new(116.40, 39.90).is_valid());
        assert!(!GeoPoint::new(181.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -91.0).is_valid());
    }
}
