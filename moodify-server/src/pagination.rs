//! Pagination utilities for history listings

use serde::Serialize;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Number of matching rows before pagination
    pub total: u64,
    /// `ceil(total / limit)`
    pub total_pages: u64,
    pub has_more: bool,
}

impl Pagination {
    /// Offset for SQL LIMIT/OFFSET or slice skipping
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Calculate pagination metadata from total results and requested page
///
/// Pages past the end are not clamped: they produce an offset beyond the
/// result set, so the caller returns an empty page with `has_more = false`.
///
/// # Examples
/// ```
/// use moodify_server::pagination::calculate_pagination;
///
/// // 50 results in pages of 10
/// let p = calculate_pagination(50, 1, 10);
/// assert_eq!(p.total_pages, 5);
/// assert!(p.has_more);
///
/// let p = calculate_pagination(50, 100, 10);
/// assert!(!p.has_more);
/// assert_eq!(p.offset(), 990);
/// ```
pub fn calculate_pagination(total: u64, page: u32, limit: u32) -> Pagination {
    let limit = limit.max(1);
    let page = page.max(1);
    let total_pages = total.div_ceil(u64::from(limit));

    Pagination {
        page,
        limit,
        total,
        total_pages,
        has_more: u64::from(page) < total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_first_page() {
        let p = calculate_pagination(50, 1, 10);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 5);
        assert_eq!(p.offset(), 0);
        assert!(p.has_more);
    }

    #[test]
    fn test_pagination_last_page() {
        let p = calculate_pagination(50, 5, 10);
        assert_eq!(p.offset(), 40);
        assert!(!p.has_more);
    }

    #[test]
    fn test_pagination_partial_last_page() {
        let p = calculate_pagination(45, 5, 10);
        assert_eq!(p.total_pages, 5);
        assert!(!p.has_more);
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, 1, 20);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_more);
    }

    #[test]
    fn test_pagination_zero_page_treated_as_first() {
        let p = calculate_pagination(30, 0, 10);
        assert_eq!(p.page, 1);
        assert_eq!(p.offset(), 0);
    }
}
