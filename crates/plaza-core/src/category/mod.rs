//! Listing categories.

mod model;
mod repository;

pub use model::{Category, CategoryId};
pub use repository::CategoryRepository;
