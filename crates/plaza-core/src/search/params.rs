//! Search parameter types.
//!
//! Parameters double as cache keys: the serialized form of a parameter
//! set identifies its cached result page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::{ActivityKind, ActivityStatus};
use crate::category::CategoryId;
use crate::pagination::PageRequest;
use crate::post::PostKind;

/// Radius applied when a geo filter names no explicit distance.
pub const DEFAULT_RADIUS_METERS: f64 = 5000.0;

/// Restrict results to a radius around a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearFilter {
    /// Center longitude.
    pub longitude: f64,
    /// Center latitude.
    pub latitude: f64,
    /// Radius in meters; [`DEFAULT_RADIUS_METERS`] when absent.
    pub max_distance_m: Option<f64>,
}

impl NearFilter {
    /// Create a filter with the default radius.
    #[must_use]
    pub const fn around(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            max_distance_m: None,
        }
    }

    /// The effective radius in meters.
    #[must_use]
    pub fn radius_m(&self) -> f64 {
        self.max_distance_m.unwrap_or(DEFAULT_RADIUS_METERS)
    }
}

/// How post results are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchSort {
    /// Most recent first (default).
    #[default]
    Newest,
    /// Most viewed first.
    MostViewed,
    /// Cheapest first; posts without a price sort last.
    PriceAscending,
}

/// Parameters for a post search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostSearchParams {
    /// Full-text keyword over title and content.
    pub keyword: Option<String>,
    /// Restrict to one kind.
    pub kind: Option<PostKind>,
    /// Restrict to one category.
    pub category_id: Option<CategoryId>,
    /// Restrict to a radius around a point.
    pub near: Option<NearFilter>,
    /// Only posts created at or after this instant.
    pub created_from: Option<DateTime<Utc>>,
    /// Only posts created at or before this instant.
    pub created_to: Option<DateTime<Utc>>,
    /// Result ordering; ignored when a geo filter is present (nearest
    /// first wins).
    #[serde(default)]
    pub sort: SearchSort,
    /// Page to fetch.
    #[serde(default)]
    pub page: PageRequest,
}

/// Parameters for an activity search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivitySearchParams {
    /// Keyword over title and description.
    pub keyword: Option<String>,
    /// Restrict to online or offline activities.
    pub kind: Option<ActivityKind>,
    /// Restrict to one lifecycle state.
    pub status: Option<ActivityStatus>,
    /// Restrict to a radius around a point.
    pub near: Option<NearFilter>,
    /// Only activities starting at or after this instant.
    pub starts_from: Option<DateTime<Utc>>,
    /// Only activities starting at or before this instant.
    pub starts_to: Option<DateTime<Utc>>,
    /// Page to fetch.
    #[serde(default)]
    pub page: PageRequest,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn near_filter_default_radius() {
        let filter = NearFilter::around(116.40, 39.90);
        assert!((filter.radius_m() - DEFAULT_RADIUS_METERS).abs() < f64::EPSILON);
    }

    #[test]
    fn identical_params_serialize_identically() {
        let a = PostSearchParams {
            keyword: Some("bike".to_string()),
            kind: Some(PostKind::SecondHand),
            ..PostSearchParams::default()
        };
        let b = PostSearchParams {
            keyword: Some("bike".to_string()),
            kind: Some(PostKind::SecondHand),
            ..PostSearchParams::default()
        };
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn different_pages_serialize_differently() {
        let first = PostSearchParams::default();
        let second = PostSearchParams {
            page: crate::pagination::PageRequest::new(2, 10),
            ..PostSearchParams::default()
        };
        assert_ne!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
