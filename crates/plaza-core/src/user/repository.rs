//! User storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use super::credentials;
use super::model::{User, UserId, UserRole, UserStatus};
use crate::db::Database;
use crate::pagination::{Page, PageRequest};
use crate::{Error, Result};

/// Filters for member listings.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Substring match over username and phone.
    pub keyword: Option<String>,
    /// Restrict to a single account status.
    pub status: Option<UserStatus>,
}

/// Partial profile update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// New username.
    pub username: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New avatar URL.
    pub avatar: Option<String>,
    /// New self-description.
    pub bio: Option<String>,
}

/// Repository for user storage and retrieval.
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new repository over the shared database.
    ///
    /// Creates the tables if they don't exist.
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

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                phone TEXT UNIQUE,
                password_digest TEXT NOT NULL,
                avatar TEXT,
                bio TEXT,
                role TEXT NOT NULL DEFAULT 'user',
                status TEXT NOT NULL DEFAULT 'active',
                last_login_at TEXT,
                last_login_ip TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_users_role_status
            ON users(role, status)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Register a new user.
    ///
    /// The password is stored as a salted digest only.
    ///
    /// # Errors
    ///
    /// Returns `Error::Conflict` when the username, email, or phone is
    /// already taken, or an error if the database operation fails.
    pub async fn create(&self, user: &mut User, password: &str) -> Result<()> {
        let existing = sqlx::query("SELECT id FROM users WHERE username = ? OR email = ?")
            .bind(&user.username)
            .bind(&user.email)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(Error::Conflict(
                "username or email already registered".to_string(),
            ));
        }

        if let Some(phone) = &user.phone {
            let taken = sqlx::query("SELECT id FROM users WHERE phone = ?")
                .bind(phone)
                .fetch_optional(&self.pool)
                .await?;
            if taken.is_some() {
                return Err(Error::Conflict("phone already registered".to_string()));
            }
        }

        let digest = credentials::hash_password(password);
        let result = sqlx::query(
            r"
            INSERT INTO users (username, email, phone, password_digest, avatar, bio, role, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&digest)
        .bind(&user.avatar)
        .bind(&user.bio)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .execute(&self.pool)
        .await?;

        user.id = Some(UserId::new(result.last_insert_rowid()));
        debug!("registered user {} ({})", user.username, result.last_insert_rowid());
        Ok(())
    }

    /// Get user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, username, email, phone, avatar, bio, role, status,
                   last_login_at, last_login_ip, created_at
            FROM users
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_user))
    }

    /// Get user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, username, email, phone, avatar, bio, role, status,
                   last_login_at, last_login_ip, created_at
            FROM users
            WHERE username = ?
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_user))
    }

    /// Check a username/password pair and record the sign-in.
    ///
    /// A missing user and a wrong password are indistinguishable to the
    /// caller.
    ///
    /// # Errors
    ///
    /// `Error::InvalidCredentials` when the pair does not match,
    /// `Error::AccountBanned` for banned accounts, or an error if the
    /// database operation fails.
    pub async fn verify_login(
        &self,
        username: &str,
        password: &str,
        ip: Option<&str>,
    ) -> Result<User> {
        let row = sqlx::query(
            r"
            SELECT id, username, email, phone, avatar, bio, role, status,
                   last_login_at, last_login_ip, created_at, password_digest
            FROM users
            WHERE username = ?
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(Error::InvalidCredentials);
        };

        let digest: String = row.get("password_digest");
        if !credentials::verify_password(password, &digest) {
            return Err(Error::InvalidCredentials);
        }

        let mut user = row_to_user(&row);
        if user.is_banned() {
            return Err(Error::AccountBanned);
        }

        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE users SET last_login_at = ?, last_login_ip = ? WHERE id = ?")
            .bind(&now)
            .bind(ip)
            .bind(row.get::<i64, _>("id"))
            .execute(&self.pool)
            .await?;

        user.last_login_at = Some(now);
        user.last_login_ip = ip.map(ToString::to_string);
        Ok(user)
    }

    /// Update profile fields; `None` fields keep their current value.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown user, or an error if the
    /// database operation fails.
    pub async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> Result<User> {
        let result = sqlx::query(
            r"
            UPDATE users SET
                username = COALESCE(?, username),
                email = COALESCE(?, email),
                avatar = COALESCE(?, avatar),
                bio = COALESCE(?, bio),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            ",
        )
        .bind(&update.username)
        .bind(&update.email)
        .bind(&update.avatar)
        .bind(&update.bio)
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("user", id.0));
        }

        self.get(id).await?.ok_or(Error::NotFound("user", id.0))
    }

    /// Change an account's status.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown user, or an error if the
    /// database operation fails.
    pub async fn set_status(&self, id: UserId, status: UserStatus) -> Result<()> {
        let result =
            sqlx::query("UPDATE users SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
                .bind(status.as_str())
                .bind(id.0)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("user", id.0));
        }
        Ok(())
    }

    /// Replace a user's password digest.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown user, or an error if the
    /// database operation fails.
    pub async fn reset_password(&self, id: UserId, new_password: &str) -> Result<()> {
        let digest = credentials::hash_password(new_password);
        let result = sqlx::query(
            "UPDATE users SET password_digest = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(&digest)
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("user", id.0));
        }
        Ok(())
    }

    /// Remove a user record entirely.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown user, or an error if the
    /// database operation fails.
    pub async fn delete(&self, id: UserId) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("user", id.0));
        }
        Ok(())
    }

    /// List non-admin members, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_members(&self, filter: &UserFilter, page: PageRequest) -> Result<Page<User>> {
        let mut query = sqlx::QueryBuilder::new(
            r"
            SELECT id, username, email, phone, avatar, bio, role, status,
                   last_login_at, last_login_ip, created_at
            FROM users
            WHERE role != 'admin'
            ",
        );
        push_member_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query.build().fetch_all(&self.pool).await?;
        let users = rows.iter().map(row_to_user).collect();

        let mut count = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM users WHERE role != 'admin'");
        push_member_filters(&mut count, filter);
        let total: i64 = count.build().fetch_one(&self.pool).await?.get(0);

        #[allow(clippy::cast_sign_loss)]
        Ok(Page::new(users, page, total as u64))
    }

    /// Count non-admin members.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_members(&self) -> Result<u64> {
        let total: i64 = sqlx::query("SELECT COUNT(*) FROM users WHERE role != 'admin'")
            .fetch_one(&self.pool)
            .await?
            .get(0);
        #[allow(clippy::cast_sign_loss)]
        Ok(total as u64)
    }

    /// Count non-admin members registered at or after the given instant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_members_since(&self, since: DateTime<Utc>) -> Result<u64> {
        let total: i64 =
            sqlx::query("SELECT COUNT(*) FROM users WHERE role != 'admin' AND created_at >= ?")
                .bind(since.format("%Y-%m-%d %H:%M:%S").to_string())
                .fetch_one(&self.pool)
                .await?
                .get(0);
        #[allow(clippy::cast_sign_loss)]
        Ok(total as u64)
    }
}

fn push_member_filters(query: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>, filter: &UserFilter) {
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(keyword) = &filter.keyword {
        let pattern = format!("%{keyword}%");
        query
            .push(" AND (username LIKE ")
            .push_bind(pattern.clone())
            .push(" OR phone LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Convert a database row to a User. The password digest stays behind.
fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: Some(UserId::new(row.get("id"))),
        username: row.get("username"),
        email: row.get("email"),
        phone: row.get("phone"),
        avatar: row.get("avatar"),
        bio: row.get("bio"),
        role: UserRole::parse(row.get("role")),
        status: UserStatus::parse(row.get("status")),
        last_login_at: row.get("last_login_at"),
        last_login_ip: row.get("last_login_ip"),
        created_at: row.get("created_at"),
    }
}
