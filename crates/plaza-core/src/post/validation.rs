//! Post input validation.

use super::model::Post;

/// Validation error for post input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title is empty.
    EmptyTitle,
    /// Body text is empty.
    EmptyContent,
    /// The kind requires a price and none was given.
    MissingPrice,
    /// Price is negative.
    NegativePrice,
    /// Coordinates are outside WGS84 bounds.
    InvalidCoordinates,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "Title is required",
            Self::EmptyContent => "Content is required",
            Self::MissingPrice => "A price is required for this kind of post",
            Self::NegativePrice => "Price must not be negative",
            Self::InvalidCoordinates => "Coordinates are out of range",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "title",
            Self::EmptyContent => "content",
            Self::MissingPrice | Self::NegativePrice => "price",
            Self::InvalidCoordinates => "location",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a post.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate a post before it is stored.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_post(post: &Post) -> ValidationResult {
    let mut errors = Vec::new();

    if post.title.trim().is_empty() {
        errors.push(ValidationError::EmptyTitle);
    }
    if post.content.trim().is_empty() {
        errors.push(ValidationError::EmptyContent);
    }

    match post.price {
        None if post.kind.requires_price() => errors.push(ValidationError::MissingPrice),
        Some(price) if price < 0.0 => errors.push(ValidationError::NegativePrice),
        _ => {}
    }

    if !post.location.point.is_valid() {
        errors.push(ValidationError::InvalidCoordinates);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::category::CategoryId;
    use crate::post::{GeoPoint, Location, PostKind};
    use crate::user::UserId;

    fn post(kind: PostKind) -> Post {
        Post::new(
            "Bike for sale",
            "Barely used",
            kind,
            CategoryId::new(1),
            UserId::new(1),
            Location::at(GeoPoint::new(116.40, 39.90)),
        )
    }

    #[test]
    fn second_hand_without_price_fails() {
        let errors = validate_post(&post(PostKind::SecondHand)).unwrap_err();
        assert!(errors.contains(&ValidationError::MissingPrice));
    }

    #[test]
    fn service_without_price_passes() {
        assert!(validate_post(&post(PostKind::Service)).is_ok());
    }

    #[test]
    fn negative_price_fails() {
        let invalid = post(PostKind::SecondHand).with_price(-1.0);
        let errors = validate_post(&invalid).unwrap_err();
        assert!(errors.contains(&ValidationError::NegativePrice));
    }

    #[test]
    fn empty_fields_and_bad_coordinates_are_collected() {
        let mut invalid = post(PostKind::Service);
        invalid.title = "  ".to_string();
        invalid.content = String::new();
        invalid.location.point = GeoPoint::new(200.0, 0.0);

        let errors = validate_post(&invalid).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyTitle));
        assert!(errors.contains(&ValidationError::EmptyContent));
        assert!(errors.contains(&ValidationError::InvalidCoordinates));
    }
}
