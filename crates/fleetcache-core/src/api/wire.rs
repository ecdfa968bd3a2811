//! Normalisation of collection responses.
//!
//! Backends answer a collection GET either with a bare JSON array or with an
//! envelope whose item array may be called `items`, `notifications`,
//! `messages`, `data` or `results`. Everything is turned into a `RemotePage`
//! here so the store never sees the variance.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::source::{PageRequest, RemotePage};
use super::ApiError;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CollectionResponse<T> {
    Bare(Vec<T>),
    Envelope(Envelope<T>),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(
        alias = "notifications",
        alias = "messages",
        alias = "data",
        alias = "results"
    )]
    items: Vec<T>,
    #[serde(alias = "totalCount", alias = "count")]
    total: Option<usize>,
    page: Option<usize>,
    #[serde(rename = "pageSize", alias = "limit")]
    page_size: Option<usize>,
    #[serde(rename = "hasMore")]
    has_more: Option<bool>,
}

/// Parse a collection response body into a `RemotePage`.
///
/// Missing paging fields are filled from the request. A bare array is taken
/// to be the complete collection.
pub fn parse_page<T: DeserializeOwned>(
    body: &str,
    request: &PageRequest,
) -> Result<RemotePage<T>, ApiError> {
    let parsed: CollectionResponse<T> = serde_json::from_str(body).map_err(|e| {
        ApiError::InvalidResponse(format!("Unrecognised collection response: {}", e))
    })?;

    Ok(match parsed {
        CollectionResponse::Bare(items) => RemotePage {
            total: items.len(),
            page: request.page,
            page_size: request.page_size,
            has_more: false,
            items,
        },
        CollectionResponse::Envelope(env) => {
            let page = env.page.unwrap_or(request.page).max(1);
            let page_size = env.page_size.unwrap_or(request.page_size);
            let seen = (page - 1) * page_size + env.items.len();
            let total = env.total.unwrap_or(seen);
            let has_more = env.has_more.unwrap_or(match env.total {
                Some(total) => seen < total,
                // Without a total, a full page suggests there is another one
                None => page_size > 0 && env.items.len() == page_size,
            });
            RemotePage {
                items: env.items,
                total,
                page,
                page_size,
                has_more,
            }
        }
    })
}
