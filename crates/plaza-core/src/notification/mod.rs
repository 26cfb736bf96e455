//! User notifications.
//!
//! System announcements plus the messages generated by comments,
//! replies, follows, and activity registrations.

mod model;
mod repository;
mod service;

pub use model::{Notification, NotificationId, NotificationKind, NotificationView};
pub use repository::NotificationRepository;
pub use service::NotificationService;
