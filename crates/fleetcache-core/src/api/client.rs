//! HTTP client for the fleet portal REST API.
//!
//! One `ApiClient` serves every resource type; the collection path comes from
//! [`Resource::RESOURCE`]. Routes:
//!
//! - `GET    /{resource}?page=&pageSize=&sortBy=&sortOrder=`
//! - `PATCH  /{resource}/{id}/{flag}` with `{"value": bool}`
//! - `DELETE /{resource}/{id}`
//! - `PATCH  /{resource}/bulk/{flag}` with `{"ids": [...], "value": bool}`
//! - `DELETE /{resource}/bulk` with `{"ids": [...]}`
//! - `DELETE /{resource}`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::models::{Flag, Resource};

use super::source::{PageRequest, RemotePage, RemoteSource};
use super::wire::parse_page;
use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the portal backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

impl ApiClient {
    /// Create a new API client for `base_url` (e.g. `https://portal.example.com/api`)
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: impl Into<Arc<str>>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: Arc::clone(&self.base_url),
            token: Some(token.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url<T: Resource>(&self) -> String {
        format!("{}/{}", self.base_url, T::RESOURCE)
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        match self.token.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder, url: &str) -> Result<(), ApiError> {
        let response = builder.send().await?;
        Self::check_response(response).await?;
        debug!(url = url, "Request acknowledged");
        Ok(())
    }

    async fn fetch_collection<T: DeserializeOwned>(
        &self,
        url: &str,
        request: &PageRequest,
    ) -> Result<RemotePage<T>, ApiError> {
        let response = self
            .request(Method::GET, url)
            .query(&request.query_pairs())
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        debug!(url = url, page = request.page, bytes = text.len(), "Collection response received");
        parse_page(&text, request)
    }
}

#[async_trait]
impl<T> RemoteSource<T> for ApiClient
where
    T: Resource + DeserializeOwned,
{
    async fn fetch_page(&self, request: &PageRequest) -> Result<RemotePage<T>, ApiError> {
        let url = self.collection_url::<T>();
        self.fetch_collection(&url, request).await
    }

    async fn set_flag(&self, id: &str, flag: Flag, value: bool) -> Result<(), ApiError> {
        let url = format!("{}/{}/{}", self.collection_url::<T>(), id, flag.path_segment());
        let builder = self
            .request(Method::PATCH, &url)
            .json(&json!({ "value": value }));
        self.send(builder, &url).await
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let url = format!("{}/{}", self.collection_url::<T>(), id);
        let builder = self.request(Method::DELETE, &url);
        self.send(builder, &url).await
    }

    async fn bulk_set_flag(&self, ids: &[String], flag: Flag, value: bool) -> Result<(), ApiError> {
        let url = format!("{}/bulk/{}", self.collection_url::<T>(), flag.path_segment());
        let builder = self
            .request(Method::PATCH, &url)
            .json(&json!({ "ids": ids, "value": value }));
        self.send(builder, &url).await
    }

    async fn bulk_delete(&self, ids: &[String]) -> Result<(), ApiError> {
        let url = format!("{}/bulk", self.collection_url::<T>());
        let builder = self
            .request(Method::DELETE, &url)
            .json(&json!({ "ids": ids }));
        self.send(builder, &url).await
    }

    async fn clear_all(&self) -> Result<(), ApiError> {
        let url = self.collection_url::<T>();
        let builder = self.request(Method::DELETE, &url);
        self.send(builder, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Message, Notification};

    #[test]
    fn test_collection_url_uses_resource_path() {
        let client = ApiClient::new("https://portal.example.com/api/").unwrap();
        assert_eq!(client.base_url(), "https://portal.example.com/api");
        assert_eq!(
            client.collection_url::<Notification>(),
            "https://portal.example.com/api/notifications"
        );
        assert_eq!(
            client.collection_url::<Message>(),
            "https://portal.example.com/api/messages"
        );
    }

    #[test]
    fn test_with_token_shares_base_url() {
        let client = ApiClient::new("http://localhost:8080").unwrap();
        let authed = client.with_token("abc");
        assert_eq!(authed.base_url(), client.base_url());
        assert_eq!(authed.token.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is not expected to speak HTTP
        let client = ApiClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let request = PageRequest::new(1, 10, Default::default());
        let result: Result<RemotePage<Notification>, ApiError> =
            RemoteSource::<Notification>::fetch_page(&client, &request).await;
        assert!(matches!(result, Err(ApiError::Network(_))));
    }
}
