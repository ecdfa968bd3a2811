//! Remote API module for the portal backend.
//!
//! This module provides the `RemoteSource` trait stores depend on, the
//! reqwest-based `ApiClient` implementing it, and the wire normalisation
//! that turns the backend's varying collection shapes into one `RemotePage`.
//!
//! The API uses bearer token authentication when a token is configured.

pub mod client;
pub mod error;
pub mod source;
pub mod wire;

pub use client::ApiClient;
pub use error::ApiError;
pub use source::{PageRequest, RemotePage, RemoteSource};
