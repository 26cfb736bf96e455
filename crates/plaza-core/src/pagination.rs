//! Pagination primitives shared by list and search operations.

use serde::{Deserialize, Serialize};

/// First page number.
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size.
pub const DEFAULT_PER_PAGE: u32 = 10;
/// Upper bound on page size.
pub const MAX_PER_PAGE: u32 = 100;

/// A clamped page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
}

impl PageRequest {
    /// Creates a page request, clamping out-of-range values.
    ///
    /// Page 0 becomes page 1; a page size of 0 becomes the default and
    /// anything above the maximum is capped.
    #[must_use]
    pub const fn new(page: u32, per_page: u32) -> Self {
        let page = if page == 0 { DEFAULT_PAGE } else { page };
        let per_page = if per_page == 0 {
            DEFAULT_PER_PAGE
        } else if per_page > MAX_PER_PAGE {
            MAX_PER_PAGE
        } else {
            per_page
        };
        Self { page, per_page }
    }

    /// Row offset for a SQL `LIMIT ?, OFFSET ?` pair.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        ((self.page - 1) as i64) * (self.per_page as i64)
    }

    /// Row limit for a SQL `LIMIT ?, OFFSET ?` pair.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PER_PAGE)
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total matching items across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    /// Assembles a page from items and a total count.
    #[must_use]
    pub const fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
        }
    }

    /// True when no items matched at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }
}
