use async_trait::async_trait;

use crate::filter::Sort;
use crate::models::Flag;

use super::ApiError;

/// Parameters of one page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
    pub sort: Sort,
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize, sort: Sort) -> Self {
        Self {
            page: page.max(1),
            page_size,
            sort,
        }
    }

    /// Query string pairs sent with the collection GET
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("pageSize", self.page_size.to_string()),
            ("sortBy", self.sort.key.wire_name().to_string()),
            ("sortOrder", self.sort.order.wire_name().to_string()),
        ]
    }
}

/// A page as returned by the backend, already normalised.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePage<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
}

/// The backend a store talks to.
///
/// `ApiClient` is the HTTP implementation; tests supply in-memory ones.
#[async_trait]
pub trait RemoteSource<T>: Send + Sync + 'static {
    async fn fetch_page(&self, request: &PageRequest) -> Result<RemotePage<T>, ApiError>;

    async fn set_flag(&self, id: &str, flag: Flag, value: bool) -> Result<(), ApiError>;

    async fn delete(&self, id: &str) -> Result<(), ApiError>;

    async fn bulk_set_flag(&self, ids: &[String], flag: Flag, value: bool) -> Result<(), ApiError>;

    async fn bulk_delete(&self, ids: &[String]) -> Result<(), ApiError>;

    async fn clear_all(&self) -> Result<(), ApiError>;
}
