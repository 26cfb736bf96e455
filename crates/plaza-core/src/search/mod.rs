//! Search over posts and activities.
//!
//! Query planning is left entirely to the engine: keywords go through
//! the FTS5 mirror (posts) or `LIKE` (activities), geo filters are a
//! bounding-box predicate with an arithmetic distance ordering. Results
//! are cached in-process for a fixed TTL with no invalidation on writes.

mod params;
mod service;

pub use params::{
    ActivitySearchParams, DEFAULT_RADIUS_METERS, NearFilter, PostSearchParams, SearchSort,
};
pub use service::{SEARCH_RESULT_TTL, SearchService};
