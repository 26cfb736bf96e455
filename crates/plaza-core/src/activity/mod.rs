//! Community activities.
//!
//! Organized events with a registration window, a capacity limit, and a
//! participant roster.

mod model;
mod repository;
mod service;

pub use model::{
    Activity, ActivityId, ActivityKind, ActivityStatus, Participant, ParticipantStatus,
};
pub use repository::{ActivityFilter, ActivityRepository};
pub(crate) use repository::row_to_activity;
pub use service::ActivityService;
