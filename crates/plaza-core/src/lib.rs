//! # plaza-core
//!
//! Core domain logic for the Plaza community marketplace.
//!
//! This crate provides:
//! - User accounts, profiles, and sign-in verification
//! - Classified posts (second-hand goods, jobs, housing, services)
//! - Categories, comments, follows, favorites, and notifications
//! - Community activities with capacity-limited registration
//! - **Cached search** - engine-delegated full-text and geo queries with
//!   a fixed-TTL in-process result cache
//! - **Publication screening** - every post passes the external content
//!   classifier (via `plaza-audit`) before going live
//! - Moderation: reports, manual review, member administration
//!
//! Storage is SQLite via `sqlx`; every repository exposes an
//! `in_memory()`-backed setup path for tests through [`Database`].
//! There is intentionally no HTTP layer here.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod activity;
pub mod admin;
pub mod cache;
pub mod category;
pub mod comment;
mod config;
mod db;
mod error;
pub mod favorite;
pub mod follow;
pub mod notification;
pub mod pagination;
pub mod post;
pub mod report;
pub mod screening;
pub mod search;
pub mod user;

pub use activity::{
    Activity, ActivityFilter, ActivityId, ActivityKind, ActivityRepository, ActivityService,
    ActivityStatus, Participant, ParticipantStatus,
};
pub use admin::{AdminService, Statistics};
pub use cache::{CacheStats, TtlCache};
pub use category::{Category, CategoryId, CategoryRepository};
pub use comment::{Comment, CommentId, CommentRepository, CommentService, CommentStatus, CommentView};
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use favorite::{FavoriteEntry, FavoriteRepository, FavoriteService};
pub use follow::{FollowEntry, FollowRepository, FollowService};
pub use notification::{
    Notification, NotificationId, NotificationKind, NotificationRepository, NotificationService,
    NotificationView,
};
pub use pagination::{Page, PageRequest};
pub use post::{
    Contact, GeoPoint, HouseDetails, JobDetails, Location, Post, PostDetail, PostFilter, PostId,
    PostKind, PostRepository, PostStatus, PostSummary, PostUpdate,
};
pub use report::{Report, ReportId, ReportKind, ReportRepository, ReportStatus};
pub use screening::{Screening, ScreeningService};
pub use search::{
    ActivitySearchParams, NearFilter, PostSearchParams, SearchService, SearchSort,
};
pub use user::{User, UserFilter, UserId, UserRepository, UserRole, UserStatus};
