//! Server-side pagination cursor

use serde::{Deserialize, Serialize};

/// Pagination snapshot returned by paginated endpoints. `current_page` is 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationCursor {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub page_size: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PaginationCursor {
    /// Build a cursor from a total count, deriving everything else
    pub fn from_count(current_page: u32, page_size: u32, total_count: u64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_count.div_ceil(page_size as u64).max(1) as u32;
        let current_page = current_page.max(1);
        Self {
            current_page,
            total_pages,
            total_count,
            page_size,
            has_next: current_page < total_pages,
            has_previous: current_page > 1,
        }
    }

    /// Whether `page` is a valid target for a page change
    pub fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }

    pub fn next_page(&self) -> Option<u32> {
        self.has_next.then_some(self.current_page + 1)
    }

    pub fn previous_page(&self) -> Option<u32> {
        self.has_previous.then_some(self.current_page - 1)
    }

    /// Footer label, e.g. `Page 2 of 5 (93 total)`
    pub fn summary(&self) -> String {
        format!(
            "Page {} of {} ({} total)",
            self.current_page, self.total_pages, self.total_count
        )
    }
}

/// Pagination object as sent by the backend; any field may be missing
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawPagination {
    #[serde(default, alias = "page")]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default, alias = "count", alias = "total")]
    pub total_count: Option<u64>,
    #[serde(default, alias = "limit", alias = "per_page")]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub has_next: Option<bool>,
    #[serde(default)]
    pub has_previous: Option<bool>,
}

impl RawPagination {
    /// Fill gaps from the page that was requested
    pub fn into_cursor(self, requested_page: u32, requested_size: u32) -> PaginationCursor {
        let current_page = self.current_page.unwrap_or(requested_page).max(1);
        let page_size = self.page_size.unwrap_or(requested_size).max(1);

        let derived = PaginationCursor::from_count(
            current_page,
            page_size,
            self.total_count.unwrap_or(0),
        );

        let total_pages = self.total_pages.unwrap_or(derived.total_pages).max(1);
        let total_count = self
            .total_count
            .unwrap_or(total_pages as u64 * page_size as u64);

        PaginationCursor {
            current_page,
            total_pages,
            total_count,
            page_size,
            has_next: self.has_next.unwrap_or(current_page < total_pages),
            has_previous: self.has_previous.unwrap_or(current_page > 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_count() {
        let cursor = PaginationCursor::from_count(2, 10, 25);
        assert_eq!(cursor.total_pages, 3);
        assert!(cursor.has_next);
        assert!(cursor.has_previous);
        assert_eq!(cursor.next_page(), Some(3));
        assert_eq!(cursor.previous_page(), Some(1));

        let empty = PaginationCursor::from_count(1, 10, 0);
        assert_eq!(empty.total_pages, 1);
        assert!(!empty.has_next);
        assert_eq!(empty.previous_page(), None);
    }

    #[test]
    fn test_contains_is_one_indexed() {
        let cursor = PaginationCursor::from_count(1, 20, 100);
        assert!(!cursor.contains(0));
        assert!(cursor.contains(1));
        assert!(cursor.contains(5));
        assert!(!cursor.contains(6));
    }

    #[test]
    fn test_raw_pagination_fills_gaps() {
        let raw: RawPagination =
            serde_json::from_str(r#"{"current_page":3,"total_pages":4,"total_count":70}"#).unwrap();
        let cursor = raw.into_cursor(1, 20);
        assert_eq!(cursor.current_page, 3);
        assert_eq!(cursor.page_size, 20);
        assert!(cursor.has_next);
        assert!(cursor.has_previous);

        let explicit: RawPagination = serde_json::from_str(
            r#"{"current_page":1,"total_pages":1,"total_count":3,"page_size":20,"has_next":false,"has_previous":false}"#,
        )
        .unwrap();
        assert_eq!(explicit.into_cursor(1, 20), PaginationCursor::from_count(1, 20, 3));
    }
}
