//! Data Transfer Objects
//!
//! Response envelope and pagination shapes shared by every backend endpoint.

use serde::{Deserialize, Serialize};

/// Standard response wrapper: `{ success, message, data }`
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

/// Error body: only the message is relied upon
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorEnvelope {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u32 = 10;

    /// Empty first page
    pub fn first(limit: u32) -> Self {
        Self {
            total: 0,
            page: 1,
            limit,
            pages: 0,
        }
    }

    /// Number of pages needed for `total` items
    pub fn page_count(total: u64, limit: u32) -> u32 {
        if limit == 0 {
            return 0;
        }
        total.div_ceil(limit as u64) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::first(Self::DEFAULT_LIMIT)
    }
}

/// Pagination as sent by the backend; any field may be missing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPagination {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub pages: Option<u32>,
}

/// List payload: paginated object or a bare array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListBody<T> {
    Paginated {
        #[serde(default = "Vec::new")]
        data: Vec<T>,
        #[serde(default)]
        pagination: Option<RawPagination>,
    },
    Flat(Vec<T>),
}

/// One page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Resolve a list payload against the page that was requested.
    ///
    /// Missing pagination fields fall back to the request; a bare array
    /// becomes a single page holding every item.
    pub fn from_body(body: ListBody<T>, requested_page: u32, requested_limit: u32) -> Self {
        match body {
            ListBody::Paginated { data, pagination } => {
                let raw = pagination.unwrap_or_default();
                let total = raw.total.unwrap_or(0);
                let limit = raw.limit.unwrap_or(requested_limit);
                Self {
                    items: data,
                    pagination: Pagination {
                        total,
                        page: raw.page.unwrap_or(requested_page),
                        limit,
                        pages: raw
                            .pages
                            .unwrap_or_else(|| Pagination::page_count(total, limit)),
                    },
                }
            }
            ListBody::Flat(items) => {
                let count = items.len();
                Self {
                    items,
                    pagination: Pagination {
                        total: count as u64,
                        page: 1,
                        limit: count as u32,
                        pages: 1,
                    },
                }
            }
        }
    }

    pub fn empty(requested_page: u32, requested_limit: u32) -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination {
                page: requested_page,
                ..Pagination::first(requested_limit)
            },
        }
    }
}

/// Sort direction for list endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// Query string pairs for a request
pub type QueryParams = Vec<(String, String)>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Item {
        id: String,
    }

    #[test]
    fn test_paginated_body() {
        let body: ListBody<Item> = serde_json::from_value(json!({
            "data": [{"id": "a"}, {"id": "b"}],
            "pagination": {"total": 25, "page": 2, "limit": 10, "pages": 3}
        }))
        .unwrap();

        let page = Page::from_body(body, 2, 10);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pagination.pages, 3);
        assert!(page.pagination.has_next());
        assert!(page.pagination.has_previous());
    }

    #[test]
    fn test_missing_page_count_is_derived() {
        let body: ListBody<Item> = serde_json::from_value(json!({
            "data": [{"id": "a"}],
            "pagination": {"total": 21}
        }))
        .unwrap();

        let page = Page::from_body(body, 1, 10);
        assert_eq!(page.pagination.page, 1);
        assert_eq!(page.pagination.limit, 10);
        assert_eq!(page.pagination.pages, 3);
    }

    #[test]
    fn test_flat_body() {
        let body: ListBody<Item> =
            serde_json::from_value(json!([{"id": "a"}, {"id": "b"}, {"id": "c"}])).unwrap();

        let page = Page::from_body(body, 4, 10);
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.page, 1);
        assert_eq!(page.pagination.pages, 1);
        assert!(!page.pagination.has_next());
    }

    #[test]
    fn test_page_count() {
        assert_eq!(Pagination::page_count(0, 10), 0);
        assert_eq!(Pagination::page_count(10, 10), 1);
        assert_eq!(Pagination::page_count(11, 10), 2);
        assert_eq!(Pagination::page_count(5, 0), 0);
    }

    #[test]
    fn test_error_envelope() {
        let env: ErrorEnvelope = serde_json::from_value(json!({"error": "bad"})).unwrap();
        assert_eq!(env.into_message().as_deref(), Some("bad"));
    }
}
