//! Shared pagination types for API query parameters.
//!
//! List endpoints use page-based pagination with `page` and `limit`
//! parameters; responses report `totalPages` so clients can render pagers.

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 10;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 100;

/// Standard pagination parameters for list endpoints.
///
/// - `page`: 1-based page number (default: 1)
/// - `limit`: Maximum items to return (default: 10, max: 100)
///
/// The `limit` is clamped to ensure it's always between 1 and 100,
/// preventing both zero-result queries and excessive data fetching.
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
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
    /// Get the page number, defaulting to 1 and never below 1.
    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get the limit value, clamped between 1 and MAX_LIMIT.
    /// Defaults to DEFAULT_LIMIT if not specified.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Number of rows to skip for the current page. Saturates rather than
    /// overflowing on absurd page numbers; the query just returns no rows.
    #[inline]
    pub fn skip(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Total number of pages for `total` matching rows: `ceil(total / limit)`.
    /// Zero rows means zero pages.
    #[inline]
    pub fn total_pages(&self, total: i64) -> i64 {
        let limit = self.limit();
        (total + limit - 1) / limit
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
        // Zero is clamped to 1
        let p = Pagination {
            page: None,
            limit: Some(0),
        };
        assert_eq!(p.limit(), 1);

        // Negative is clamped to 1
        let p = Pagination {
            page: None,
            limit: Some(-5),
        };
        assert_eq!(p.limit(), 1);

        // Over max is clamped to MAX_LIMIT
        let p = Pagination {
            page: None,
            limit: Some(1000),
        };
        assert_eq!(p.limit(), MAX_LIMIT);

        // Valid value passes through
        let p = Pagination {
            page: None,
            limit: Some(50),
        };
        assert_eq!(p.limit(), 50);
    }

    #[test]
    fn test_page_clamping_and_skip() {
        // Page below 1 is clamped
        let p = Pagination {
            page: Some(0),
            limit: Some(10),
        };
        assert_eq!(p.page(), 1);
        assert_eq!(p.skip(), 0);

        // Page 3 with limit 10 skips 20
        let p = Pagination {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(p.skip(), 20);
    }

    #[test]
    fn test_skip_saturates_on_huge_page() {
        let p = Pagination {
            page: Some(i64::MAX),
            limit: Some(100),
        };
        assert_eq!(p.skip(), i64::MAX);

        let p = Pagination {
            page: Some(i64::MAX),
            limit: Some(1),
        };
        assert_eq!(p.skip(), i64::MAX - 1);
    }

    #[test]
    fn test_total_pages() {
        let p = Pagination {
            page: None,
            limit: Some(10),
        };
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(1), 1);
        assert_eq!(p.total_pages(10), 1);
        assert_eq!(p.total_pages(11), 2);
        assert_eq!(p.total_pages(25), 3);
    }
}
