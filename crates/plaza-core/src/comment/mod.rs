//! Comments on posts.

mod model;
mod repository;
mod service;

pub use model::{Comment, CommentId, CommentStatus, CommentView};
pub use repository::CommentRepository;
pub use service::CommentService;
