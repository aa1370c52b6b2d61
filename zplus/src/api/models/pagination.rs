//! Page-based pagination shared by every list endpoint.
//!
//! Clients send `page` (1-based) and `limit`; responses carry a [`PaginationMeta`] derived purely
//! from those two values and the total row count.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 10;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 100;

/// Default page size for wallet transaction history.
pub const DEFAULT_HISTORY_LIMIT: i64 = 20;

/// `page` and `limit` query parameters.
///
/// Both are optional; `limit` is clamped to `[1, 100]` and `page` to `>= 1`.
#[serde_as]
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// 1-based page number (default: 1)
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page: Option<i64>,

    /// Maximum number of items to return (default: 10, max: 100)
    #[param(default = 10, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Limit for history listings: anything outside `[1, 100]` falls back to `default` rather
    /// than being clamped.
    #[inline]
    pub fn limit_or(&self, default: i64) -> i64 {
        match self.limit {
            Some(limit) if (1..=MAX_LIMIT).contains(&limit) => limit,
            _ => default,
        }
    }

    /// Row offset of the first item on the requested page
    #[inline]
    pub fn skip(&self) -> i64 {
        offset_for(self.page(), self.limit())
    }
}

/// Row offset of `page` (1-based) at `limit` rows per page. Saturates for pages past `i64::MAX` rows.
#[inline]
pub fn offset_for(page: i64, limit: i64) -> i64 {
    page.saturating_sub(1).max(0).saturating_mul(limit)
}

/// Pagination metadata returned next to every page of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: i64, limit: i64, total_items: i64) -> Self {
        let total_pages = if limit > 0 { (total_items + limit - 1) / limit } else { 0 };
        Self {
            current_page: page,
            total_pages,
            total_items,
            items_per_page: limit,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// A page of items plus its metadata; the `data` payload of list responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T: ToSchema> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, page: i64, limit: i64, total_items: i64) -> Self {
        Self {
            items,
            pagination: PaginationMeta::new(page, limit, total_items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let p = Pagination::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), DEFAULT_LIMIT);
        assert_eq!(p.skip(), 0);
    }

    #[test]
    fn test_limit_clamping() {
        assert_eq!(Pagination::new(1, 0).limit(), 1);
        assert_eq!(Pagination::new(1, -5).limit(), 1);
        assert_eq!(Pagination::new(1, 1000).limit(), MAX_LIMIT);
        assert_eq!(Pagination::new(1, 50).limit(), 50);
    }

    #[test]
    fn test_page_clamping_and_skip() {
        assert_eq!(Pagination::new(0, 10).page(), 1);
        assert_eq!(Pagination::new(-3, 10).skip(), 0);
        assert_eq!(Pagination::new(3, 10).skip(), 20);
    }

    #[test]
    fn test_huge_page_saturates_offset() {
        assert_eq!(Pagination::new(i64::MAX, 10).skip(), i64::MAX);
        assert_eq!(Pagination::new(i64::MAX, 1).skip(), i64::MAX - 1);
        assert_eq!(offset_for(i64::MAX, 20), i64::MAX);
        assert_eq!(offset_for(i64::MIN, 20), 0);
    }

    #[test]
    fn test_history_limit_falls_back() {
        assert_eq!(Pagination::default().limit_or(DEFAULT_HISTORY_LIMIT), 20);
        assert_eq!(Pagination::new(1, 0).limit_or(DEFAULT_HISTORY_LIMIT), 20);
        assert_eq!(Pagination::new(1, 500).limit_or(DEFAULT_HISTORY_LIMIT), 20);
        assert_eq!(Pagination::new(1, 5).limit_or(DEFAULT_HISTORY_LIMIT), 5);
    }

    #[test]
    fn test_meta_for_twenty_five_items() {
        let first = PaginationMeta::new(1, 10, 25);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next);
        assert!(!first.has_prev);

        let last = PaginationMeta::new(3, 10, 25);
        assert!(!last.has_next);
        assert!(last.has_prev);
        // Items on the last page: 25 - skip(20)
        assert_eq!(25 - Pagination::new(3, 10).skip(), 5);
    }

    #[test]
    fn test_meta_for_empty_result() {
        let meta = PaginationMeta::new(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn test_query_string_parsing() {
        let p: Pagination = serde_urlencoded::from_str("page=2&limit=5").unwrap();
        assert_eq!(p.page(), 2);
        assert_eq!(p.limit(), 5);
    }
}
