//! Activity registration service.
//!
//! Registration touches two records: the participant row and the
//! activity's registration counter. The two writes are separate
//! statements with no transaction around them; a crash in between can
//! leave the counter out of step with the roster.

use tracing::debug;

use super::model::ActivityStatus;
use super::repository::ActivityRepository;
use crate::activity::ActivityId;
use crate::notification::NotificationService;
use crate::user::UserId;
use crate::{Error, Result};

/// Service for registering to activities.
pub struct ActivityService {
    activities: ActivityRepository,
    notifications: NotificationService,
}

impl ActivityService {
    /// Create a service over the given repositories.
    #[must_use]
    pub const fn new(activities: ActivityRepository, notifications: NotificationService) -> Self {
        Self {
            activities,
            notifications,
        }
    }

    /// The underlying activity repository.
    #[must_use]
    pub const fn activities(&self) -> &ActivityRepository {
        &self.activities
    }

    /// Register a user for an activity and notify the organizer.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` for an unknown activity, `Error::InvalidState`
    /// when the activity is not open (unpublished, past its deadline, or
    /// full), `Error::Conflict` for a duplicate registration, or an
    /// error if a database operation fails.
    pub async fn register(&self, activity_id: ActivityId, user: UserId) -> Result<()> {
        let activity = self
            .activities
            .get(activity_id)
            .await?
            .ok_or(Error::NotFound("activity", activity_id.0))?;

        if activity.status != ActivityStatus::Published {
            return Err(Error::InvalidState(
                "activity is not open for registration".to_string(),
            ));
        }
        if chrono::Utc::now() >= activity.registration_deadline {
            return Err(Error::InvalidState("registration has closed".to_string()));
        }
        if self
            .activities
            .find_participant(activity_id, user)
            .await?
            .is_some()
        {
            return Err(Error::Conflict(
                "already registered for this activity".to_string(),
            ));
        }
        if activity.is_full() {
            return Err(Error::InvalidState("activity is full".to_string()));
        }

        // Roster row and counter are two separate writes.
        self.activities.add_participant(activity_id, user).await?;
        self.activities.adjust_participants(activity_id, 1).await?;
        debug!("user {user} registered for activity {activity_id}");

        self.notifications
            .notify_post(
                activity.organizer,
                user,
                "New registration",
                &format!("Someone registered for your activity: {}", activity.title),
                Some(activity_id.0),
            )
            .await?;

        Ok(())
    }

    /// Withdraw a registration.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` when the activity or the registration does not
    /// exist, or an error if a database operation fails.
    pub async fn cancel_registration(&self, activity_id: ActivityId, user: UserId) -> Result<()> {
        if self.activities.get(activity_id).await?.is_none() {
            return Err(Error::NotFound("activity", activity_id.0));
        }

        self.activities
            .remove_participant(activity_id, user)
            .await?;
        self.activities.adjust_participants(activity_id, -1).await?;
        debug!("user {user} left activity {activity_id}");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::activity::{Activity, ActivityKind};
    use crate::db::Database;
    use crate::notification::NotificationRepository;
    use crate::pagination::PageRequest;
    use crate::post::GeoPoint;
    use crate::user::{User, UserRepository};
    use chrono::{Duration, Utc};

    struct Fixture {
        service: ActivityService,
        notifications: NotificationRepository,
        organizer: UserId,
        guest: UserId,
        other_guest: UserId,
    }

    async fn setup() -> Fixture {
        let db = Database::in_memory().await.unwrap();

        let users = UserRepository::new(&db).await.unwrap();
        let mut organizer = User::new("host_01", "host@example.com");
        users.create(&mut organizer, "abc123").await.unwrap();
        let mut guest = User::new("guest_1", "guest1@example.com");
        users.create(&mut guest, "abc123").await.unwrap();
        let mut other_guest = User::new("guest_2", "guest2@example.com");
        users.create(&mut other_guest, "abc123").await.unwrap();

        let service = ActivityService::new(
            ActivityRepository::new(&db).await.unwrap(),
            NotificationService::new(NotificationRepository::new(&db).await.unwrap()),
        );

        Fixture {
            service,
            notifications: NotificationRepository::new(&db).await.unwrap(),
            organizer: organizer.id.unwrap(),
            guest: guest.id.unwrap(),
            other_guest: other_guest.id.unwrap(),
        }
    }

    async fn published_activity(f: &Fixture, capacity: i64) -> ActivityId {
        let now = Utc::now();
        let mut activity = Activity {
            id: None,
            title: "Board game night".to_string(),
            description: "Bring your own snacks".to_string(),
            cover: "https://cdn.example.com/games.jpg".to_string(),
            venue: "Community center, room 2".to_string(),
            point: Some(GeoPoint::new(116.40, 39.90)),
            start_time: now + Duration::days(3),
            end_time: now + Duration::days(3) + Duration::hours(4),
            registration_deadline: now + Duration::days(2),
            max_participants: capacity,
            current_participants: 0,
            status: crate::activity::ActivityStatus::Draft,
            kind: ActivityKind::Offline,
            organizer: f.organizer,
            created_at: None,
            updated_at: None,
        };
        f.service.activities().create(&mut activity).await.unwrap();
        let id = activity.id.unwrap();
        f.service.activities().publish(id).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_register_updates_roster_counter_and_notifies() {
        let f = setup().await;
        let id = published_activity(&f, 5).await;

        f.service.register(id, f.guest).await.unwrap();

        let activity = f.service.activities().get(id).await.unwrap().unwrap();
        assert_eq!(activity.current_participants, 1);

        let roster = f.service.activities().participants(id).await.unwrap();
        assert_eq!(roster.len(), 1);

        let inbox = f
            .notifications
            .list(f.organizer, None, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(inbox.total, 1);
        assert!(inbox.items[0].notification.content.contains("Board game night"));
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let f = setup().await;
        let id = published_activity(&f, 5).await;

        f.service.register(id, f.guest).await.unwrap();
        let err = f.service.register(id, f.guest).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_full_activity_rejects_registration() {
        let f = setup().await;
        let id = published_activity(&f, 1).await;

        f.service.register(id, f.guest).await.unwrap();
        let err = f.service.register(id, f.other_guest).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_draft_activity_rejects_registration() {
        let f = setup().await;
        let now = Utc::now();
        let mut draft = Activity {
            id: None,
            title: "Secret planning".to_string(),
            description: "Not announced yet".to_string(),
            cover: "https://cdn.example.com/planning.jpg".to_string(),
            venue: "TBD".to_string(),
            point: None,
            start_time: now + Duration::days(10),
            end_time: now + Duration::days(10) + Duration::hours(2),
            registration_deadline: now + Duration::days(9),
            max_participants: 10,
            current_participants: 0,
            status: crate::activity::ActivityStatus::Draft,
            kind: ActivityKind::Online,
            organizer: f.organizer,
            created_at: None,
            updated_at: None,
        };
        f.service.activities().create(&mut draft).await.unwrap();

        let err = f
            .service
            .register(draft.id.unwrap(), f.guest)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_past_deadline_rejects_registration() {
        let f = setup().await;
        let now = Utc::now();
        let mut activity = Activity {
            id: None,
            title: "Yesterday's walk".to_string(),
            description: "Registration closed".to_string(),
            cover: "https://cdn.example.com/walk.jpg".to_string(),
            venue: "River park".to_string(),
            point: None,
            start_time: now + Duration::hours(2),
            end_time: now + Duration::hours(4),
            registration_deadline: now - Duration::hours(1),
            max_participants: 10,
            current_participants: 0,
            status: crate::activity::ActivityStatus::Draft,
            kind: ActivityKind::Offline,
            organizer: f.organizer,
            created_at: None,
            updated_at: None,
        };
        f.service.activities().create(&mut activity).await.unwrap();
        let id = activity.id.unwrap();
        f.service.activities().publish(id).await.unwrap();

        let err = f.service.register(id, f.guest).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_cancel_registration_restores_capacity() {
        let f = setup().await;
        let id = published_activity(&f, 1).await;

        f.service.register(id, f.guest).await.unwrap();
        f.service.cancel_registration(id, f.guest).await.unwrap();

        let activity = f.service.activities().get(id).await.unwrap().unwrap();
        assert_eq!(activity.current_participants, 0);

        // Freed seat can be taken again.
        f.service.register(id, f.other_guest).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_unknown_registration() {
        let f = setup().await;
        let id = published_activity(&f, 5).await;

        let err = f
            .service
            .cancel_registration(id, f.guest)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound("registration", _)));
    }
}
