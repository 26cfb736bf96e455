//! Classified posts.
//!
//! Posts are the heart of the marketplace: second-hand goods, job offers,
//! housing, and local services. A post starts out pending, passes through
//! the publication screen, and expires thirty days after creation.

mod model;
mod repository;
mod validation;

pub use model::{
    Contact, GeoPoint, HouseDetails, JobDetails, Location, Post, PostDetail, PostId, PostKind,
    PostStatus, PostSummary,
};
pub use repository::{PostFilter, PostRepository, PostUpdate};
pub(crate) use repository::row_to_post;
pub use validation::{ValidationError, ValidationResult, validate_post};
