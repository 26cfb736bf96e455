//! The follow graph between users.

mod model;
mod repository;
mod service;

pub use model::FollowEntry;
pub use repository::FollowRepository;
pub use service::FollowService;
