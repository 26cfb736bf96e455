//! Activity data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::post::GeoPoint;
use crate::user::UserId;

/// Unique identifier for an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityId(pub i64);

impl ActivityId {
    /// Create a new activity ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivityStatus {
    /// Being prepared, invisible to members.
    #[default]
    Draft,
    /// Open for registration.
    Published,
    /// Called off by the organizer.
    Cancelled,
    /// Over.
    Finished,
}

impl ActivityStatus {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "published" => Self::Published,
            "cancelled" => Self::Cancelled,
            "finished" => Self::Finished,
            _ => Self::Draft,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Cancelled => "cancelled",
            Self::Finished => "finished",
        }
    }
}

/// Whether the activity happens online or at a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivityKind {
    /// Video call, livestream, or similar.
    Online,
    /// In-person gathering.
    #[default]
    Offline,
}

impl ActivityKind {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "online" => Self::Online,
            _ => Self::Offline,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

/// Registration state of one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParticipantStatus {
    /// Registered, waiting for organizer approval.
    #[default]
    Pending,
    /// Approved by the organizer.
    Approved,
    /// Turned down by the organizer.
    Rejected,
}

impl ParticipantStatus {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// A community activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier (None for unsaved activities).
    pub id: Option<ActivityId>,
    /// Headline.
    pub title: String,
    /// Long description.
    pub description: String,
    /// Cover image URL.
    pub cover: String,
    /// Venue name or meeting link.
    pub venue: String,
    /// Venue coordinates for offline activities, if known.
    pub point: Option<GeoPoint>,
    /// When the activity starts.
    pub start_time: DateTime<Utc>,
    /// When the activity ends.
    pub end_time: DateTime<Utc>,
    /// Last moment to register.
    pub registration_deadline: DateTime<Utc>,
    /// Capacity limit.
    pub max_participants: i64,
    /// Current registration count.
    pub current_participants: i64,
    /// Lifecycle state.
    pub status: ActivityStatus,
    /// Online or offline.
    pub kind: ActivityKind,
    /// Organizing user.
    pub organizer: UserId,
    /// Creation timestamp.
    pub created_at: Option<String>,
    /// Last update timestamp.
    pub updated_at: Option<String>,
}

impl Activity {
    /// Check if the activity currently accepts registrations.
    ///
    /// State must be published, the deadline must not have passed, and
    /// there must be room left.
    #[must_use]
    pub fn accepts_registrations(&self) -> bool {
        self.status == ActivityStatus::Published
            && Utc::now() < self.registration_deadline
            && self.current_participants < self.max_participants
    }

    /// Check if the capacity limit is reached.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current_participants >= self.max_participants
    }
}

/// One row of an activity's participant roster.
#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    /// The registered user.
    pub user: UserId,
    /// Their username.
    pub username: String,
    /// Their avatar URL.
    pub avatar: Option<String>,
    /// Approval state.
    pub status: ParticipantStatus,
    /// When they registered.
    pub registered_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn activity() -> Activity {
        let now = Utc::now();
        Activity {
            id: None,
            title: "Board game night".to_string(),
            description: "Bring your own snacks".to_string(),
            cover: "https://cdn.example.com/games.jpg".to_string(),
            venue: "Community center, room 2".to_string(),
            point: None,
            start_time: now + Duration::days(3),
            end_time: now + Duration::days(3) + Duration::hours(4),
            registration_deadline: now + Duration::days(2),
            max_participants: 12,
            current_participants: 0,
            status: ActivityStatus::Published,
            kind: ActivityKind::Offline,
            organizer: UserId::new(1),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn status_roundtrip() {
        for status in [
            ActivityStatus::Draft,
            ActivityStatus::Published,
            ActivityStatus::Cancelled,
            ActivityStatus::Finished,
        ] {
            assert_eq!(ActivityStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn participant_status_roundtrip() {
        for status in [
            ParticipantStatus::Pending,
            ParticipantStatus::Approved,
            ParticipantStatus::Rejected,
        ] {
            assert_eq!(ParticipantStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn published_activity_with_room_accepts() {
        assert!(activity().accepts_registrations());
    }

    #[test]
    fn draft_activity_does_not_accept() {
        let mut a = activity();
        a.status = ActivityStatus::Draft;
        assert!(!a.accepts_registrations());
    }

    #[test]
    fn full_activity_does_not_accept() {
        let mut a = activity();
        a.current_participants = a.max_participants;
        assert!(a.is_full());
        assert!(!a.accepts_registrations());
    }

    #[test]
    fn past_deadline_does_not_accept() {
        let mut a = activity();
        a.registration_deadline = Utc::now() - chrono::Duration::hours(1);
        assert!(!a.accepts_registrations());
    }
}
