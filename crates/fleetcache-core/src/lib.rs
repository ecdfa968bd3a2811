//! Core library for fleetcache.
//!
//! Client-side reactive stores for the transport portal's REST resources
//! (notifications, support messages). Each `ResourceStore` wraps one remote
//! collection with a TTL cache, local filtering and pagination, optimistic
//! mutations and deterministic fallback data when the backend is down.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fallback;
pub mod filter;
pub mod models;
pub mod page;
pub mod store;
pub mod summary;
pub mod utils;

pub use api::{ApiClient, ApiError, PageRequest, RemotePage, RemoteSource};
pub use cache::{CacheOrigin, CacheState};
pub use config::{Config, StoreConfig};
pub use error::StoreError;
pub use filter::{Filter, Selector, Sort, SortKey, SortOrder, Status};
pub use models::{Flag, Message, Notification, NotificationKind, Priority, Resource};
pub use page::{paginate, Page, DEFAULT_PAGE_SIZE};
pub use store::{Mutation, Op, ResourceStore};
pub use summary::Summary;

/// Store of portal notifications backed by the HTTP API
pub type NotificationStore = ResourceStore<Notification, ApiClient>;

/// Store of support messages backed by the HTTP API
pub type MessageStore = ResourceStore<Message, ApiClient>;
