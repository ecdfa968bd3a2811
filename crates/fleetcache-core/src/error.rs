use thiserror::Error;

use crate::api::ApiError;

/// Failures a store can observe.
///
/// Neither is ever returned from a load or mutation: network failures are
/// recovered with fallback data or swallowed, and unknown ids are no-ops.
/// They appear on the store's error stream and in logs.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(#[from] ApiError),

    #[error("Item not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
