//! In-memory cache for one resource collection.
//!
//! A `CacheEntry` holds the unfiltered items for a store together with the
//! time of the last successful first-page fetch. It is considered fresh
//! while that fetch is younger than the store's cache timeout.

pub mod entry;

pub use entry::{CacheEntry, CacheOrigin, CacheState, FlagChange};
