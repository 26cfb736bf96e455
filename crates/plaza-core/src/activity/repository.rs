//! Activity storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqlitePool;

use super::model::{
    Activity, ActivityId, ActivityKind, ActivityStatus, Participant, ParticipantStatus,
};
use crate::db::Database;
use crate::pagination::{Page, PageRequest};
use crate::post::GeoPoint;
use crate::user::UserId;
use crate::{Error, Result};

/// Filters for activity listings.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    /// Restrict to one lifecycle state.
    pub status: Option<ActivityStatus>,
    /// Restrict to online or offline activities.
    pub kind: Option<ActivityKind>,
    /// Restrict to one organizer.
    pub organizer: Option<UserId>,
}

/// Repository for activity storage and retrieval.
pub struct ActivityRepository {
    pool: SqlitePool,
}

impl ActivityRepository {
    /// Create a new repository over the shared database.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails.
    pub async fn new(db: &Database) -> Result<Self> {
        let repo = Self {
            pool: db.pool().clone(),
        };
        repo.initialize().await?;
        Ok(repo)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS activities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                cover TEXT NOT NULL,
                venue TEXT NOT NULL,
                longitude REAL,
                latitude REAL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                registration_deadline TEXT NOT NULL,
                max_participants INTEGER NOT NULL,
                current_participants INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'draft',
                kind TEXT NOT NULL,
                organizer_id INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_activities_status_start
            ON activities(status, start_time)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_activities_organizer
            ON activities(organizer_id, created_at DESC)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS activity_participants (
                activity_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                registered_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(activity_id, user_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_participants_user
            ON activity_participants(user_id, status)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a new activity.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create(&self, activity: &mut Activity) -> Result<()> {
        let result = sqlx::query(
            r"
            INSERT INTO activities (
                title, description, cover, venue, longitude, latitude,
                start_time, end_time, registration_deadline,
                max_participants, current_participants, status, kind, organizer_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&activity.title)
        .bind(&activity.description)
        .bind(&activity.cover)
        .bind(&activity.venue)
        .bind(activity.point.map(|p| p.longitude))
        .bind(activity.point.map(|p| p.latitude))
        .bind(activity.start_time.to_rfc3339())
        .bind(activity.end_time.to_rfc3339())
        .bind(activity.registration_deadline.to_rfc3339())
        .bind(activity.max_participants)
        .bind(activity.current_participants)
        .bind(activity.status.as_str())
        .bind(activity.kind.as_str())
        .bind(activity.organizer.0)
        .execute(&self.pool)
        .await?;

        activity.id = Some(ActivityId::new(result.last_insert_rowid()));
        Ok(())
    }

    /// Get activity by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: ActivityId) -> Result<Option<Activity>> {
        let row = sqlx::query(&format!("{ACTIVITY_COLUMNS} FROM activities WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().and_then(row_to_activity))
    }

    /// Open a draft activity for registration.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown activity,
    /// `Error::InvalidState` when it is not a draft, or an error if the
    /// database operation fails.
    pub async fn publish(&self, id: ActivityId) -> Result<()> {
        self.transition(id, ActivityStatus::Draft, ActivityStatus::Published)
            .await
    }

    /// Call off a draft or published activity.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown activity,
    /// `Error::InvalidState` when it already ended, or an error if the
    /// database operation fails.
    pub async fn cancel(&self, id: ActivityId) -> Result<()> {
        let activity = self.get(id).await?.ok_or(Error::NotFound("activity", id.0))?;
        match activity.status {
            ActivityStatus::Draft | ActivityStatus::Published => {
                self.force_status(id, ActivityStatus::Cancelled).await
            }
            ActivityStatus::Cancelled | ActivityStatus::Finished => Err(Error::InvalidState(
                format!("cannot cancel a {} activity", activity.status.as_str()),
            )),
        }
    }

    /// Mark a published activity as over.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown activity,
    /// `Error::InvalidState` when it was never published, or an error if
    /// the database operation fails.
    pub async fn finish(&self, id: ActivityId) -> Result<()> {
        self.transition(id, ActivityStatus::Published, ActivityStatus::Finished)
            .await
    }

    async fn transition(
        &self,
        id: ActivityId,
        from: ActivityStatus,
        to: ActivityStatus,
    ) -> Result<()> {
        let activity = self.get(id).await?.ok_or(Error::NotFound("activity", id.0))?;
        if activity.status != from {
            return Err(Error::InvalidState(format!(
                "cannot move a {} activity to {}",
                activity.status.as_str(),
                to.as_str()
            )));
        }
        self.force_status(id, to).await
    }

    async fn force_status(&self, id: ActivityId, status: ActivityStatus) -> Result<()> {
        sqlx::query("UPDATE activities SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(status.as_str())
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// List activities, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: &ActivityFilter, page: PageRequest) -> Result<Page<Activity>> {
        let mut query =
            sqlx::QueryBuilder::new(format!("{ACTIVITY_COLUMNS} FROM activities WHERE 1 = 1"));
        push_activity_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query.build().fetch_all(&self.pool).await?;
        let activities = rows.iter().filter_map(row_to_activity).collect();

        let mut count = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM activities WHERE 1 = 1");
        push_activity_filters(&mut count, filter);
        let total: i64 = count.build().fetch_one(&self.pool).await?.get(0);

        #[allow(clippy::cast_sign_loss)]
        Ok(Page::new(activities, page, total as u64))
    }

    /// The roster of an activity, in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn participants(&self, id: ActivityId) -> Result<Vec<Participant>> {
        let rows = sqlx::query(
            r"
            SELECT ap.user_id, ap.status, ap.registered_at, u.username, u.avatar
            FROM activity_participants ap
            JOIN users u ON u.id = ap.user_id
            WHERE ap.activity_id = ?
            ORDER BY ap.registered_at ASC, ap.user_id ASC
            ",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Participant {
                user: UserId::new(row.get("user_id")),
                username: row.get("username"),
                avatar: row.get("avatar"),
                status: ParticipantStatus::parse(row.get("status")),
                registered_at: row.get("registered_at"),
            })
            .collect())
    }

    /// Look up one user's registration, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_participant(
        &self,
        id: ActivityId,
        user: UserId,
    ) -> Result<Option<ParticipantStatus>> {
        let row = sqlx::query(
            "SELECT status FROM activity_participants WHERE activity_id = ? AND user_id = ?",
        )
        .bind(id.0)
        .bind(user.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| ParticipantStatus::parse(r.get("status"))))
    }

    /// Add a pending registration row.
    ///
    /// # Errors
    ///
    /// Returns `Error::Conflict` when the user is already registered, or
    /// an error if the database operation fails.
    pub async fn add_participant(&self, id: ActivityId, user: UserId) -> Result<()> {
        let inserted = sqlx::query(
            r"
            INSERT OR IGNORE INTO activity_participants (activity_id, user_id, status)
            VALUES (?, ?, 'pending')
            ",
        )
        .bind(id.0)
        .bind(user.0)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(Error::Conflict(
                "already registered for this activity".to_string(),
            ));
        }
        Ok(())
    }

    /// Remove a registration row.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the user was not registered, or an
    /// error if the database operation fails.
    pub async fn remove_participant(&self, id: ActivityId, user: UserId) -> Result<()> {
        let result =
            sqlx::query("DELETE FROM activity_participants WHERE activity_id = ? AND user_id = ?")
                .bind(id.0)
                .bind(user.0)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("registration", user.0));
        }
        Ok(())
    }

    /// Adjust the registration counter, clamping at zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn adjust_participants(&self, id: ActivityId, delta: i64) -> Result<()> {
        sqlx::query(
            r"
            UPDATE activities
            SET current_participants = MAX(0, current_participants + ?),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            ",
        )
        .bind(delta)
        .bind(id.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Set one participant's approval state.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the user is not registered, or an
    /// error if the database operation fails.
    pub async fn set_participant_status(
        &self,
        id: ActivityId,
        user: UserId,
        status: ParticipantStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE activity_participants SET status = ? WHERE activity_id = ? AND user_id = ?",
        )
        .bind(status.as_str())
        .bind(id.0)
        .bind(user.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("registration", user.0));
        }
        Ok(())
    }
}

const ACTIVITY_COLUMNS: &str = r"
    SELECT id, title, description, cover, venue, longitude, latitude,
           start_time, end_time, registration_deadline,
           max_participants, current_participants, status, kind, organizer_id,
           created_at, updated_at";

fn push_activity_filters(
    query: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>,
    filter: &ActivityFilter,
) {
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(kind) = filter.kind {
        query.push(" AND kind = ").push_bind(kind.as_str());
    }
    if let Some(organizer) = filter.organizer {
        query.push(" AND organizer_id = ").push_bind(organizer.0);
    }
}

/// Convert a database row to an Activity.
///
/// Rows with unparseable timestamps are skipped.
pub(crate) fn row_to_activity(row: &sqlx::sqlite::SqliteRow) -> Option<Activity> {
    let parse = |column: &str| -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&row.get::<String, _>(column))
            .ok()
            .map(|d| d.with_timezone(&Utc))
    };

    let longitude: Option<f64> = row.get("longitude");
    let latitude: Option<f64> = row.get("latitude");
    let point = match (longitude, latitude) {
        (Some(longitude), Some(latitude)) => Some(GeoPoint::new(longitude, latitude)),
        _ => None,
    };

    Some(Activity {
        id: Some(ActivityId::new(row.get("id"))),
        title: row.get("title"),
        description: row.get("description"),
        cover: row.get("cover"),
        venue: row.get("venue"),
        point,
        start_time: parse("start_time")?,
        end_time: parse("end_time")?,
        registration_deadline: parse("registration_deadline")?,
        max_participants: row.get("max_participants"),
        current_participants: row.get("current_participants"),
        status: ActivityStatus::parse(row.get("status")),
        kind: ActivityKind::parse(row.get("kind")),
        organizer: UserId::new(row.get("organizer_id")),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
