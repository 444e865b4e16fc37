// Page/page_size query parsing and page arithmetic shared by list endpoints

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Upper bound on page_size regardless of what the client asks for
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw `?page=&page_size=` query parameters
///
/// Both are optional; missing or out-of-range values are clamped rather than
/// rejected.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<i64>,
    /// Items per page
    pub page_size: Option<i64>,
}

/// A normalized page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Normalize a query using `default_size` when page_size is absent
    pub fn from_query(query: &PageQuery, default_size: u32) -> Self {
        let page = query.page.unwrap_or(1).clamp(1, u32::MAX as i64) as u32;
        let page_size = query
            .page_size
            .unwrap_or(default_size as i64)
            .clamp(1, MAX_PAGE_SIZE as i64) as u32;
        Self { page, page_size }
    }

    /// Rows to skip
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    /// Rows to return
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

/// Pagination block returned next to every listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    #[schema(example = 2)]
    pub page: u32,
    #[schema(example = 10)]
    pub page_size: u32,
    #[schema(example = 25)]
    pub total: i64,
    #[schema(example = 3)]
    pub total_page: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let size = request.page_size as i64;
        Self {
            page: request.page,
            page_size: request.page_size,
            total,
            total_page: (total + size - 1) / size,
        }
    }
}
