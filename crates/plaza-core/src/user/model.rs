//! User model types.

use serde::{Deserialize, Serialize};

/// Unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    /// Create a new user ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserRole {
    /// Regular member.
    #[default]
    User,
    /// Administrator with moderation powers.
    Admin,
}

impl UserRole {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// Whether an account may currently act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserStatus {
    /// Account in good standing.
    #[default]
    Active,
    /// Account locked out by a moderator.
    Banned,
}

impl UserStatus {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "banned" => Self::Banned,
            _ => Self::Active,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Banned => "banned",
        }
    }
}

/// A member of the marketplace.
///
/// The password digest never leaves the repository layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (None for unsaved users).
    pub id: Option<UserId>,
    /// Unique handle shown next to posts and comments.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Optional unique mobile number.
    pub phone: Option<String>,
    /// Avatar image URL.
    pub avatar: Option<String>,
    /// Short self-description.
    pub bio: Option<String>,
    /// Account role.
    pub role: UserRole,
    /// Account status.
    pub status: UserStatus,
    /// Time of the most recent successful sign-in.
    pub last_login_at: Option<String>,
    /// IP of the most recent successful sign-in.
    pub last_login_ip: Option<String>,
    /// Registration timestamp.
    pub created_at: Option<String>,
}

impl User {
    /// Create a new unsaved user with the given identity fields.
    #[must_use]
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// Check if this user is an administrator.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    /// Check if this user is banned.
    #[must_use]
    pub const fn is_banned(&self) -> bool {
        matches!(self.status, UserStatus::Banned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_roundtrip() {
        for role in [UserRole::User, UserRole::Admin] {
            assert_eq!(UserRole::parse(role.as_str()), role);
        }
    }

    #[test]
    fn status_roundtrip() {
        for status in [UserStatus::Active, UserStatus::Banned] {
            assert_eq!(UserStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn unknown_role_defaults_to_user() {
        assert_eq!(UserRole::parse("superuser"), UserRole::User);
    }

    #[test]
    fn new_user_is_active_member() {
        let user = User::new("sam", "sam@example.com");
        assert!(!user.is_admin());
        assert!(!user.is_banned());
        assert!(user.id.is_none());
    }
}
