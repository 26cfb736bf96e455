//! Moderation and back-office operations.

mod service;

pub use service::{AdminService, Statistics};
