//! The cached search service.

use std::time::Duration;

use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use super::params::{ActivitySearchParams, NearFilter, PostSearchParams, SearchSort};
use crate::activity::Activity;
use crate::cache::{CacheStats, TtlCache};
use crate::db::Database;
use crate::pagination::{Page, PageRequest};
use crate::post::Post;
use crate::{Result, activity, post};

/// How long a search result page stays cached.
pub const SEARCH_RESULT_TTL: Duration = Duration::from_secs(300);

/// Meters per degree of latitude (and of longitude at the equator).
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Search over posts and activities with in-process result caching.
///
/// Cached pages are served for up to [`SEARCH_RESULT_TTL`] regardless of
/// writes happening underneath; the staleness window is accepted.
pub struct SearchService {
    pool: SqlitePool,
    post_results: TtlCache<Page<Post>>,
    activity_results: TtlCache<Page<Activity>>,
    result_ttl: Duration,
}

impl SearchService {
    /// Create a service over the shared database with the default
    /// result TTL.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self::with_result_ttl(db, SEARCH_RESULT_TTL)
    }

    /// Create a service with the result TTL from runtime configuration.
    #[must_use]
    pub fn from_config(db: &Database, config: &crate::Config) -> Self {
        Self::with_result_ttl(db, Duration::from_secs(config.search_cache_ttl_secs))
    }

    /// Create a service with an explicit result TTL.
    #[must_use]
    pub fn with_result_ttl(db: &Database, result_ttl: Duration) -> Self {
        Self {
            pool: db.pool().clone(),
            post_results: TtlCache::new(result_ttl),
            activity_results: TtlCache::new(result_ttl),
            result_ttl,
        }
    }

    /// Search active posts.
    ///
    /// Keyword terms go through the FTS5 mirror; a geo filter restricts
    /// to a bounding box and orders nearest first, otherwise the
    /// requested sort applies.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn search_posts(&self, params: &PostSearchParams) -> Result<Page<Post>> {
        let key = format!("search:posts:{}", serde_json::to_string(params)?);
        if let Some(hit) = self.post_results.get(&key) {
            debug!("post search served from cache");
            return Ok(hit);
        }

        let page = PageRequest::new(params.page.page, params.page.per_page);

        let mut query = sqlx::QueryBuilder::new(POST_SEARCH_COLUMNS);
        push_post_clauses(&mut query, params);
        match (params.near, params.sort) {
            (Some(near), _) => push_distance_order(&mut query, near),
            (None, SearchSort::Newest) => {
                query.push(" ORDER BY posts.created_at DESC, posts.id DESC");
            }
            (None, SearchSort::MostViewed) => {
                query.push(" ORDER BY posts.views DESC, posts.id DESC");
            }
            (None, SearchSort::PriceAscending) => {
                query.push(" ORDER BY posts.price IS NULL, posts.price ASC, posts.id DESC");
            }
        }
        query
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query.build().fetch_all(&self.pool).await?;
        let posts = rows.iter().filter_map(post::row_to_post).collect();

        let mut count = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM posts");
        push_post_clauses(&mut count, params);
        let total: i64 = count.build().fetch_one(&self.pool).await?.get(0);

        #[allow(clippy::cast_sign_loss)]
        let result = Page::new(posts, page, total as u64);
        self.post_results
            .insert_with_ttl(key, result.clone(), self.result_ttl);
        Ok(result)
    }

    /// Search activities, ordered by start time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn search_activities(&self, params: &ActivitySearchParams) -> Result<Page<Activity>> {
        let key = format!("search:activities:{}", serde_json::to_string(params)?);
        if let Some(hit) = self.activity_results.get(&key) {
            debug!("activity search served from cache");
            return Ok(hit);
        }

        let page = PageRequest::new(params.page.page, params.page.per_page);

        let mut query = sqlx::QueryBuilder::new(ACTIVITY_SEARCH_COLUMNS);
        push_activity_clauses(&mut query, params);
        query
            .push(" ORDER BY start_time ASC, id ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query.build().fetch_all(&self.pool).await?;
        let activities = rows.iter().filter_map(activity::row_to_activity).collect();

        let mut count = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM activities");
        push_activity_clauses(&mut count, params);
        let total: i64 = count.build().fetch_one(&self.pool).await?.get(0);

        #[allow(clippy::cast_sign_loss)]
        let result = Page::new(activities, page, total as u64);
        self.activity_results
            .insert_with_ttl(key, result.clone(), self.result_ttl);
        Ok(result)
    }

    /// Hit/miss counters for both result caches (posts, activities).
    #[must_use]
    pub fn cache_stats(&self) -> (CacheStats, CacheStats) {
        (self.post_results.stats(), self.activity_results.stats())
    }

    /// Drop every cached result page.
    pub fn clear_cache(&self) {
        self.post_results.clear();
        self.activity_results.clear();
    }
}

const POST_SEARCH_COLUMNS: &str = r"
    SELECT posts.id, posts.title, posts.content, posts.kind, posts.category_id, posts.price,
           posts.job_json, posts.house_json, posts.images_json,
           posts.longitude, posts.latitude, posts.address, posts.city, posts.district,
           posts.contact_json, posts.author_id, posts.views, posts.favorites, posts.status,
           posts.review_reason, posts.reviewed_at, posts.reviewer_id,
           posts.created_at, posts.updated_at, posts.expires_at
    FROM posts";

const ACTIVITY_SEARCH_COLUMNS: &str = r"
    SELECT id, title, description, cover, venue, longitude, latitude,
           start_time, end_time, registration_deadline,
           max_participants, current_participants, status, kind, organizer_id,
           created_at, updated_at
    FROM activities";

/// Effective keyword: trimmed, `None` when empty.
fn effective_keyword(keyword: Option<&str>) -> Option<&str> {
    keyword.map(str::trim).filter(|k| !k.is_empty())
}

/// Quote a raw keyword into an FTS5 query: every whitespace-separated
/// term becomes a quoted phrase (implicit AND), so user input cannot
/// inject FTS5 operators.
fn fts_query(raw: &str) -> String {
    raw.split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Bounding box half-widths in degrees for a radius around a latitude.
fn bounding_deltas(latitude: f64, radius_m: f64) -> (f64, f64) {
    let cos_lat = latitude.to_radians().cos().max(1e-6);
    let lat_delta = radius_m / METERS_PER_DEGREE;
    let lng_delta = radius_m / (METERS_PER_DEGREE * cos_lat);
    (lat_delta, lng_delta)
}

fn push_near_clause(
    query: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>,
    near: NearFilter,
    table: &str,
) {
    let (lat_delta, lng_delta) = bounding_deltas(near.latitude, near.radius_m());
    query
        .push(format!(" AND {table}.latitude BETWEEN "))
        .push_bind(near.latitude - lat_delta)
        .push(" AND ")
        .push_bind(near.latitude + lat_delta)
        .push(format!(" AND {table}.longitude BETWEEN "))
        .push_bind(near.longitude - lng_delta)
        .push(" AND ")
        .push_bind(near.longitude + lng_delta);
}

/// Nearest-first ordering: squared equirectangular distance, evaluated
/// by the engine.
fn push_distance_order(query: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>, near: NearFilter) {
    let cos_lat = near.latitude.to_radians().cos().max(1e-6);
    query
        .push(" ORDER BY ((posts.latitude - ")
        .push_bind(near.latitude)
        .push(") * (posts.latitude - ")
        .push_bind(near.latitude)
        .push(")) + (((posts.longitude - ")
        .push_bind(near.longitude)
        .push(") * ")
        .push_bind(cos_lat)
        .push(") * ((posts.longitude - ")
        .push_bind(near.longitude)
        .push(") * ")
        .push_bind(cos_lat)
        .push(")) ASC");
}

fn push_post_clauses(query: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>, params: &PostSearchParams) {
    let keyword = effective_keyword(params.keyword.as_deref());

    if keyword.is_some() {
        query.push(" JOIN posts_fts ON posts_fts.rowid = posts.id");
    }
    query.push(" WHERE posts.status = 'active'");

    if let Some(keyword) = keyword {
        query.push(" AND posts_fts MATCH ").push_bind(fts_query(keyword));
    }
    if let Some(kind) = params.kind {
        query.push(" AND posts.kind = ").push_bind(kind.as_str());
    }
    if let Some(category_id) = params.category_id {
        query
            .push(" AND posts.category_id = ")
            .push_bind(category_id.0);
    }
    if let Some(from) = params.created_from {
        query
            .push(" AND posts.created_at >= ")
            .push_bind(from.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Some(to) = params.created_to {
        query
            .push(" AND posts.created_at <= ")
            .push_bind(to.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Some(near) = params.near {
        push_near_clause(query, near, "posts");
    }
}

fn push_activity_clauses(
    query: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>,
    params: &ActivitySearchParams,
) {
    query.push(" WHERE 1 = 1");

    if let Some(keyword) = effective_keyword(params.keyword.as_deref()) {
        let pattern = format!("%{keyword}%");
        query
            .push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR description LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(kind) = params.kind {
        query.push(" AND kind = ").push_bind(kind.as_str());
    }
    if let Some(status) = params.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(from) = params.starts_from {
        query.push(" AND start_time >= ").push_bind(from.to_rfc3339());
    }
    if let Some(to) = params.starts_to {
        query.push(" AND start_time <= ").push_bind(to.to_rfc3339());
    }
    if let Some(near) = params.near {
        push_near_clause(query, near, "activities");
    }
}
