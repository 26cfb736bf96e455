//! User reports against posts.

mod model;
mod repository;

pub use model::{Report, ReportId, ReportKind, ReportStatus};
pub use repository::ReportRepository;
