//! Report data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::post::PostId;
use crate::user::UserId;

/// Unique identifier for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub i64);

impl ReportId {
    /// Create a new report ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

/// Why a post was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportKind {
    /// Unsolicited advertising.
    Spam,
    /// Illegal content or goods.
    Illegal,
    /// Sexual content.
    Porn,
    /// Scams and fraud.
    Fraud,
    /// Anything else.
    #[default]
    Other,
}

impl ReportKind {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "spam" => Self::Spam,
            "illegal" => Self::Illegal,
            "porn" => Self::Porn,
            "fraud" => Self::Fraud,
            _ => Self::Other,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Spam => "spam",
            Self::Illegal => "illegal",
            Self::Porn => "porn",
            Self::Fraud => "fraud",
            Self::Other => "other",
        }
    }
}

/// Whether a moderator has handled the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportStatus {
    /// Waiting in the moderation queue.
    #[default]
    Pending,
    /// Handled by a moderator.
    Processed,
}

impl ReportStatus {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "processed" => Self::Processed,
            _ => Self::Pending,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
        }
    }
}

/// A user's report against a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Unique identifier (None for unsaved reports).
    pub id: Option<ReportId>,
    /// Who reported.
    pub reporter: UserId,
    /// The reported post.
    pub post: PostId,
    /// Reported violation kind.
    pub kind: ReportKind,
    /// Free-form description from the reporter.
    pub description: String,
    /// Queue status.
    pub status: ReportStatus,
    /// Moderator's resolution text.
    pub result: Option<String>,
    /// When the report was handled.
    pub processed_at: Option<DateTime<Utc>>,
    /// Moderator who handled it.
    pub processor: Option<UserId>,
    /// Creation timestamp.
    pub created_at: Option<String>,
}

impl Report {
    /// Create an unsaved pending report.
    #[must_use]
    pub fn new(
        reporter: UserId,
        post: PostId,
        kind: ReportKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            reporter,
            post,
            kind,
            description: description.into(),
            status: ReportStatus::Pending,
            result: None,
            processed_at: None,
            processor: None,
            created_at: None,
        }
    }

    /// Check if this report still awaits a moderator.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, ReportStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrip() {
        for kind in [
            ReportKind::Spam,
            ReportKind::Illegal,
            ReportKind::Porn,
            ReportKind::Fraud,
            ReportKind::Other,
        ] {
            assert_eq!(ReportKind::parse(kind.as_str()), kind);
        }
    }

    #[test]
    fn status_roundtrip() {
        for status in [ReportStatus::Pending, ReportStatus::Processed] {
            assert_eq!(ReportStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn new_report_is_pending() {
        let report = Report::new(
            UserId::new(1),
            PostId::new(2),
            ReportKind::Fraud,
            "asks for deposit up front",
        );
        assert!(report.is_pending());
        assert!(report.processor.is_none());
    }
}
