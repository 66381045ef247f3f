//! Paginated listings.

use serde::{Deserialize, Serialize};

/// Pagination metadata. The server's copy is authoritative; the client
/// never recomputes totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page number.
    pub current_page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl Pagination {
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

/// One page of a server-side collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Sort order for the admin listing, sent as `field,direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CapsuleSort {
    /// Newest first.
    #[default]
    CreatedDesc,
    CreatedAsc,
    OpenTimeAsc,
    OpenTimeDesc,
}

impl CapsuleSort {
    /// The query-string value.
    #[must_use]
    pub const fn as_query(&self) -> &'static str {
        match self {
            Self::CreatedDesc => "createdAt,desc",
            Self::CreatedAsc => "createdAt,asc",
            Self::OpenTimeAsc => "openTime,asc",
            Self::OpenTimeDesc => "openTime,desc",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_page() {
        let page: Page<String> = serde_json::from_value(json!({
            "items": ["a", "b"],
            "pagination": {"currentPage": 2, "pageSize": 2, "totalItems": 5, "totalPages": 3}
        }))
        .unwrap();

        assert_eq!(page.items.len(), 2);
        assert!(page.pagination.has_next());
        assert!(page.pagination.has_previous());
    }

    #[test]
    fn test_default_sort() {
        assert_eq!(CapsuleSort::default().as_query(), "createdAt,desc");
    }
}
