use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::models::{Flag, Resource};

/// Where the cached items came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOrigin {
    Empty,
    Remote,
    Fallback,
}

/// Freshness of a cache entry relative to its timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
}

/// Outcome of setting a flag on one cached item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagChange {
    Changed,
    Unchanged,
    Unsupported,
    Missing,
}

/// The authoritative in-memory list of items for one store.
#[derive(Debug)]
pub struct CacheEntry<T> {
    items: Vec<T>,
    /// Monotonic time of the last successful page-1 fetch
    fetched_at: Option<Instant>,
    /// Wall-clock time of the same fetch, for display
    cached_at: Option<DateTime<Utc>>,
    origin: CacheOrigin,
    /// Page number of the first cached item; earlier pages are not held
    first_page: usize,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            fetched_at: None,
            cached_at: None,
            origin: CacheOrigin::Empty,
            first_page: 1,
        }
    }
}

impl<T: Resource> CacheEntry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn origin(&self) -> CacheOrigin {
        self.origin
    }

    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        self.cached_at
    }

    pub fn first_page(&self) -> usize {
        self.first_page
    }

    /// Whether the remote items before `page` are all cached, so that `page`
    /// can be appended and still line up with a local slice.
    pub fn holds_pages_before(&self, page: usize, page_size: usize) -> bool {
        self.origin == CacheOrigin::Remote
            && self.first_page <= page
            && self.items.len() >= (page - self.first_page).saturating_mul(page_size)
    }

    /// Fallback-only data is never fresh, so the next load retries the backend.
    /// Neither is a cache that does not start at page 1.
    pub fn state(&self, timeout: Duration) -> CacheState {
        match (self.origin, self.fetched_at) {
            (CacheOrigin::Empty, _) => CacheState::Empty,
            (CacheOrigin::Remote, Some(at)) if self.first_page == 1 && at.elapsed() < timeout => {
                CacheState::Fresh
            }
            _ => CacheState::Stale,
        }
    }

    pub fn is_valid(&self, timeout: Duration) -> bool {
        self.state(timeout) == CacheState::Fresh
    }

    /// Replace the cache wholesale with a first page from the backend.
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = dedup_by_id(items);
        self.fetched_at = Some(Instant::now());
        self.cached_at = Some(Utc::now());
        self.origin = CacheOrigin::Remote;
        self.first_page = 1;
    }

    /// Load items known to be current without recording a fetch.
    ///
    /// The cache holds remote data but stays stale until a page-1 fetch.
    pub fn hydrate(&mut self, items: Vec<T>) {
        self.items = dedup_by_id(items);
        self.origin = CacheOrigin::Remote;
        self.first_page = 1;
    }

    /// Restart the cache at `page` when the pages before it are not held.
    ///
    /// Does not touch the fetch time.
    pub fn start_window(&mut self, page: usize, items: Vec<T>) {
        self.items = dedup_by_id(items);
        self.origin = CacheOrigin::Remote;
        self.first_page = page.max(1);
    }

    /// Append a later page. Items whose id is already cached are replaced in place.
    ///
    /// Does not touch the fetch time; only a page-1 fetch makes the cache fresh.
    pub fn merge_page(&mut self, items: Vec<T>) {
        if self.origin != CacheOrigin::Remote {
            self.items.clear();
            self.origin = CacheOrigin::Remote;
            self.first_page = 1;
        }

        let mut positions: HashMap<String, usize> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.id().to_string(), i))
            .collect();

        for item in items {
            match positions.get(item.id()) {
                Some(&i) => self.items[i] = item,
                None => {
                    positions.insert(item.id().to_string(), self.items.len());
                    self.items.push(item);
                }
            }
        }
    }

    /// Install synthetic data. The fetch time is left alone.
    pub fn install_fallback(&mut self, items: Vec<T>) {
        self.items = items;
        self.origin = CacheOrigin::Fallback;
        self.first_page = 1;
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn set_flag(&mut self, id: &str, flag: Flag, value: bool) -> FlagChange {
        let Some(item) = self.items.iter_mut().find(|item| item.id() == id) else {
            return FlagChange::Missing;
        };
        match item.set_flag(flag, value) {
            None => FlagChange::Unsupported,
            Some(previous) if previous == value => FlagChange::Unchanged,
            Some(_) => FlagChange::Changed,
        }
    }

    /// Remove one item; returns whether it was present
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        self.items.len() != before
    }

    /// Remove every listed item and return the ids that were present
    pub fn remove_many(&mut self, ids: &[String]) -> Vec<String> {
        let mut removed = Vec::new();
        self.items.retain(|item| {
            if ids.iter().any(|id| id == item.id()) {
                removed.push(item.id().to_string());
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn age_minutes(&self) -> Option<i64> {
        self.cached_at
            .map(|cached_at| (Utc::now() - cached_at).num_minutes())
    }

    pub fn age_display(&self) -> String {
        let Some(minutes) = self.age_minutes() else {
            return "never".to_string();
        };
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            let remaining_mins = minutes % 60;
            if remaining_mins >= 30 {
                // Round up: 1h 30m+ becomes 2h
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            let remaining_hours = (minutes % 1440) / 60;
            if remaining_hours >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// Keep the last occurrence of each id, in first-seen position.
fn dedup_by_id<T: Resource>(items: Vec<T>) -> Vec<T> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(items.len());
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        match positions.get(item.id()) {
            Some(&i) => out[i] = item,
            None => {
                positions.insert(item.id().to_string(), out.len());
                out.push(item);
            }
        }
    }
    out
}
