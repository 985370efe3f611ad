//! Offset-based pagination utilities.

use serde::{Deserialize, Serialize};

/// Hard upper bound for a page size.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Raw `page`/`limit` query parameters as sent by clients.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    /// Resolves the parameters into a concrete page.
    ///
    /// A missing limit falls back to `default_limit`; any limit is then clamped
    /// to `[1, max_limit]`. Pages start at 1.
    pub fn resolve(self, default_limit: u32, max_limit: u32) -> Page {
        let max_limit = max_limit.clamp(1, MAX_PAGE_LIMIT);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, max_limit);
        let page = self.page.unwrap_or(1).max(1);
        Page { page, limit }
    }
}

/// A resolved page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    pub fn limit_i64(&self) -> i64 {
        i64::from(self.limit)
    }
}

/// Total number of pages for `total` items: `ceil(total / limit)`.
pub fn total_pages(total: i64, limit: u32) -> i64 {
    if total <= 0 || limit == 0 {
        return 0;
    }
    let limit = i64::from(limit);
    (total + limit - 1) / limit
}

/// Paginated response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_page: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, page: Page) -> Self {
        Self {
            data,
            total,
            page: page.page,
            limit: page.limit,
            total_page: total_pages(total, page.limit),
        }
    }

    /// Converts the items while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_page: self.total_page,
        }
    }
}
