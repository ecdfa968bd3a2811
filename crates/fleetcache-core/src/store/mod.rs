//! Reactive, cached view over one remote resource collection.
//!
//! A `ResourceStore` owns the cache for one resource type and is the only
//! thing that mutates it. Consumers read through `watch` channels
//! (`items`, `loading`, `errors`, `summaries`) and call `load` or one of the
//! mutation methods.
//!
//! Mutations are optimistic: the cache changes synchronously, subscribers
//! are notified, and only then is the backend call spawned. A failed backend
//! call is logged and otherwise ignored. Loads never fail either: when the
//! backend cannot be reached the store serves stale data or deterministic
//! fallback data instead.

pub mod mutation;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiError, PageRequest, RemotePage, RemoteSource};
use crate::cache::{CacheEntry, CacheOrigin, CacheState, FlagChange};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::fallback::FallbackData;
use crate::filter::{self, Filter, Sort};
use crate::models::{Flag, Resource};
use crate::page::{paginate, Page, DEFAULT_PAGE_SIZE};
use crate::summary::Summary;

pub use mutation::{Mutation, Op};

/// The filter, sort and page a consumer last asked for.
#[derive(Debug, Clone, PartialEq)]
struct View {
    filter: Filter,
    sort: Sort,
    page: usize,
    page_size: usize,
}

impl Default for View {
    fn default() -> Self {
        Self {
            filter: Filter::default(),
            sort: Sort::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

struct State<T> {
    cache: CacheEntry<T>,
    view: View,
    fallback: FallbackData<T>,
}

impl<T: Resource> State<T> {
    fn render(&self, view: &View) -> Page<T> {
        let selected = filter::apply(self.cache.items(), &view.filter, view.sort);
        let first = self.cache.first_page();
        if first == 1 {
            return paginate(&selected, view.page, view.page_size);
        }

        // The cache starts at a later page: slice relative to that page and
        // count the pages before it as present on the backend.
        let skipped = (first - 1).saturating_mul(view.page_size);
        if view.page < first {
            let mut page = Page::empty(view.page, view.page_size);
            page.total = skipped + selected.len();
            page.has_more = true;
            return page;
        }
        let mut page = paginate(&selected, view.page - first + 1, view.page_size);
        page.page = view.page;
        page.total += skipped;
        page
    }
}

struct Inner<T, R> {
    remote: Arc<R>,
    config: StoreConfig,
    state: Mutex<State<T>>,
    items_tx: watch::Sender<Page<T>>,
    loading_tx: watch::Sender<bool>,
    error_tx: watch::Sender<Option<Arc<StoreError>>>,
    summary_tx: watch::Sender<Summary>,
    in_flight: AtomicUsize,
}

/// Keeps `loading` true while at least one fetch is in flight.
struct LoadingGuard<'a> {
    in_flight: &'a AtomicUsize,
    tx: &'a watch::Sender<bool>,
}

impl<'a> LoadingGuard<'a> {
    fn enter<T, R>(inner: &'a Inner<T, R>) -> Self {
        let in_flight = &inner.in_flight;
        // Counter and flag change under the channel's lock so they never disagree
        inner.loading_tx.send_if_modified(|loading| {
            in_flight.fetch_add(1, Ordering::SeqCst);
            !std::mem::replace(loading, true)
        });
        Self {
            in_flight,
            tx: &inner.loading_tx,
        }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let in_flight = self.in_flight;
        self.tx.send_if_modified(|loading| {
            let busy = in_flight.fetch_sub(1, Ordering::SeqCst) > 1;
            std::mem::replace(loading, busy) != busy
        });
    }
}

/// Client-side store for one resource collection.
///
/// Cheap to clone; clones share the same cache and channels. Construct one per
/// resource per session and hand it to every consumer.
pub struct ResourceStore<T, R> {
    inner: Arc<Inner<T, R>>,
}

impl<T, R> Clone for ResourceStore<T, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, R> ResourceStore<T, R>
where
    T: Resource,
    R: RemoteSource<T>,
{
    pub fn new(remote: R, config: StoreConfig) -> Self {
        Self::with_shared_remote(Arc::new(remote), config)
    }

    /// Build a store over a remote that is shared with other stores
    pub fn with_shared_remote(remote: Arc<R>, config: StoreConfig) -> Self {
        let (items_tx, _) = watch::channel(Page::default());
        let (loading_tx, _) = watch::channel(false);
        let (error_tx, _) = watch::channel(None);
        let (summary_tx, _) = watch::channel(Summary::default());

        let fallback = FallbackData::new(config.fallback_seed, config.fallback_len());

        Self {
            inner: Arc::new(Inner {
                remote,
                config,
                state: Mutex::new(State {
                    cache: CacheEntry::new(),
                    view: View::default(),
                    fallback,
                }),
                items_tx,
                loading_tx,
                error_tx,
                summary_tx,
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    // =========================================================================
    // Streams
    // =========================================================================

    /// The page for the most recently requested view
    pub fn items(&self) -> watch::Receiver<Page<T>> {
        self.inner.items_tx.subscribe()
    }

    pub fn loading(&self) -> watch::Receiver<bool> {
        self.inner.loading_tx.subscribe()
    }

    /// Errors surfaced to consumers. Only populated when fallback is disabled.
    pub fn errors(&self) -> watch::Receiver<Option<Arc<StoreError>>> {
        self.inner.error_tx.subscribe()
    }

    pub fn summaries(&self) -> watch::Receiver<Summary> {
        self.inner.summary_tx.subscribe()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Recompute the summary from the current cache
    pub fn summary(&self) -> Summary {
        Summary::from_items(self.inner.state.lock().cache.items())
    }

    pub fn unread_count(&self) -> usize {
        self.summary().unread_count()
    }

    pub fn current_page(&self) -> Page<T> {
        self.inner.items_tx.borrow().clone()
    }

    pub fn cache_state(&self) -> CacheState {
        self.inner
            .state
            .lock()
            .cache
            .state(self.inner.config.cache_timeout())
    }

    pub fn cache_origin(&self) -> CacheOrigin {
        self.inner.state.lock().cache.origin()
    }

    /// Human-readable age of the last successful fetch
    pub fn cache_age(&self) -> String {
        self.inner.state.lock().cache.age_display()
    }

    /// Cache lookup only; never touches the network.
    pub fn try_get(&self, id: &str) -> Result<T> {
        self.inner
            .state
            .lock()
            .cache
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn get_by_id(&self, id: &str) -> Option<T> {
        self.try_get(id).ok()
    }

    /// Seed the cache with known-good items, e.g. restored from elsewhere.
    ///
    /// This is not a fetch: the cache stays stale, so the next first-page
    /// load still goes to the backend.
    pub fn hydrate(&self, items: Vec<T>) {
        let mut state = self.inner.state.lock();
        state.cache.hydrate(items);
        self.publish(&state);
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load one page of items matching `filter`.
    ///
    /// A first-page load is served from the cache while it is fresh, unless
    /// `force_refresh` is set. Anything else goes to the backend: a first page
    /// replaces the cache, later pages are appended to it. The filter is
    /// always applied locally to the cached superset.
    ///
    /// Never fails. On a backend error or timeout the result comes from stale
    /// cached data or from the store's fallback data.
    pub async fn load(
        &self,
        filter: Filter,
        sort: Sort,
        page: usize,
        page_size: usize,
        force_refresh: bool,
    ) -> Page<T> {
        let view = View {
            filter,
            sort,
            page: page.max(1),
            page_size,
        };

        {
            let mut state = self.inner.state.lock();
            state.view = view.clone();
            if !force_refresh && view.page == 1 && state.cache.is_valid(self.inner.config.cache_timeout()) {
                debug!(resource = T::RESOURCE, "Serving first page from cache");
                let result = state.render(&view);
                self.inner.items_tx.send_replace(result.clone());
                return result;
            }
        }

        let _loading = LoadingGuard::enter(&self.inner);
        let request = PageRequest::new(view.page, view.page_size, view.sort);
        info!(resource = T::RESOURCE, page = request.page, force_refresh, "Fetching page");
        let outcome = self.fetch(&request).await;

        // Responses are applied in completion order, each under one lock
        let mut state = self.inner.state.lock();
        let result = match outcome {
            Ok(remote) => self.apply_fetched(&mut state, &view, remote),
            Err(e) => self.recover(&mut state, &view, e),
        };
        self.publish(&state);
        result
    }

    async fn fetch(&self, request: &PageRequest) -> std::result::Result<RemotePage<T>, ApiError> {
        let timeout = self.inner.config.request_timeout();
        match tokio::time::timeout(timeout, self.inner.remote.fetch_page(request)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(timeout)),
        }
    }

    fn apply_fetched(&self, state: &mut State<T>, view: &View, remote: RemotePage<T>) -> Page<T> {
        let fetched = remote.items.len();
        if view.page == 1 {
            state.cache.replace(remote.items);
        } else if state.cache.holds_pages_before(view.page, view.page_size) {
            state.cache.merge_page(remote.items);
        } else {
            debug!(
                resource = T::RESOURCE,
                page = view.page,
                "Earlier pages not cached, restarting cache at this page"
            );
            state.cache.start_window(view.page, remote.items);
        }
        info!(
            resource = T::RESOURCE,
            page = view.page,
            fetched,
            cached = state.cache.len(),
            "Fetched page applied"
        );

        self.inner.error_tx.send_if_modified(|error| error.take().is_some());

        let mut result = state.render(view);
        // The backend may know about pages not accumulated yet
        result.has_more = result.has_more || remote.has_more;
        result
    }

    fn recover(&self, state: &mut State<T>, view: &View, error: ApiError) -> Page<T> {
        if !self.inner.config.fallback_enabled {
            warn!(
                resource = T::RESOURCE,
                error = %error,
                unreachable = error.is_unreachable(),
                "Fetch failed, fallback disabled"
            );
            self.inner
                .error_tx
                .send_replace(Some(Arc::new(StoreError::Network(error))));
        } else if state.cache.is_empty() || state.cache.first_page() > view.page {
            // Nothing cached covers this page: an empty cache, or a window
            // that starts after it.
            warn!(
                resource = T::RESOURCE,
                error = %error,
                unreachable = error.is_unreachable(),
                "Fetch failed, showing fallback data"
            );
            let items = state.fallback.items().to_vec();
            state.cache.install_fallback(items);
        } else if state.cache.origin() == CacheOrigin::Remote {
            warn!(
                resource = T::RESOURCE,
                error = %error,
                age = %state.cache.age_display(),
                "Fetch failed, serving stale cache"
            );
        } else {
            warn!(resource = T::RESOURCE, error = %error, "Fetch failed, keeping fallback data");
        }
        state.render(view)
    }

    /// Push the current view and summary to subscribers.
    fn publish(&self, state: &State<T>) {
        self.inner.items_tx.send_replace(state.render(&state.view));
        self.inner
            .summary_tx
            .send_replace(Summary::from_items(state.cache.items()));
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn set_flag(&self, id: &str, flag: Flag, value: bool) -> Mutation {
        self.mutate(Op::SetFlag {
            id: id.to_string(),
            flag,
            value,
        })
    }

    pub fn mark_read(&self, id: &str) -> Mutation {
        self.set_flag(id, Flag::Read, true)
    }

    pub fn delete(&self, id: &str) -> Mutation {
        self.mutate(Op::Delete { id: id.to_string() })
    }

    pub fn bulk_set_flag(&self, ids: &[String], flag: Flag, value: bool) -> Mutation {
        self.mutate(Op::BulkSetFlag {
            ids: ids.to_vec(),
            flag,
            value,
        })
    }

    pub fn bulk_delete(&self, ids: &[String]) -> Mutation {
        self.mutate(Op::BulkDelete { ids: ids.to_vec() })
    }

    /// Mark every cached unread item as read
    pub fn mark_all_read(&self) -> Mutation {
        let unread: Vec<String> = self
            .inner
            .state
            .lock()
            .cache
            .items()
            .iter()
            .filter(|item| item.flag(Flag::Read) == Some(false))
            .map(|item| item.id().to_string())
            .collect();
        self.bulk_set_flag(&unread, Flag::Read, true)
    }

    pub fn clear_all(&self) -> Mutation {
        self.mutate(Op::ClearAll)
    }

    fn mutate(&self, op: Op) -> Mutation {
        match self.apply_local(&op) {
            Some(sync) => self.sync_remote(sync),
            None => Mutation::local_only(false),
        }
    }

    /// Apply `op` to the cache and notify subscribers, synchronously.
    ///
    /// Returns the operation to send to the backend, narrowed to the items that
    /// actually changed, or `None` if nothing changed.
    pub fn apply_local(&self, op: &Op) -> Option<Op> {
        let mut state = self.inner.state.lock();
        let sync = match op {
            Op::SetFlag { id, flag, value } => match state.cache.set_flag(id, *flag, *value) {
                FlagChange::Changed => Some(op.clone()),
                FlagChange::Unchanged => None,
                FlagChange::Unsupported => {
                    debug!(resource = T::RESOURCE, flag = %flag, "Flag not supported");
                    None
                }
                FlagChange::Missing => {
                    let err = StoreError::NotFound(id.clone());
                    debug!(resource = T::RESOURCE, error = %err, "Ignoring flag change");
                    None
                }
            },
            Op::Delete { id } => {
                if state.cache.remove(id) {
                    Some(op.clone())
                } else {
                    let err = StoreError::NotFound(id.clone());
                    debug!(resource = T::RESOURCE, error = %err, "Ignoring delete");
                    None
                }
            }
            Op::BulkSetFlag { ids, flag, value } => {
                let changed: Vec<String> = ids
                    .iter()
                    .filter(|id| state.cache.set_flag(id, *flag, *value) == FlagChange::Changed)
                    .cloned()
                    .collect();
                if changed.is_empty() {
                    None
                } else {
                    Some(Op::BulkSetFlag {
                        ids: changed,
                        flag: *flag,
                        value: *value,
                    })
                }
            }
            Op::BulkDelete { ids } => {
                let removed = state.cache.remove_many(ids);
                if removed.is_empty() {
                    None
                } else {
                    Some(Op::BulkDelete { ids: removed })
                }
            }
            Op::ClearAll => {
                state.cache.clear();
                Some(Op::ClearAll)
            }
        };

        if sync.is_some() {
            debug!(resource = T::RESOURCE, op = op.name(), "Applied local change");
            self.publish(&state);
        }
        sync
    }

    /// Send `op` to the backend in a background task.
    ///
    /// Failures and timeouts are logged and swallowed; the local cache is
    /// never rolled back. Without a tokio runtime the sync is skipped.
    pub fn sync_remote(&self, op: Op) -> Mutation {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(resource = T::RESOURCE, op = op.name(), "No async runtime, skipping remote sync");
            return Mutation::local_only(true);
        };

        let remote = Arc::clone(&self.inner.remote);
        let timeout = self.inner.config.request_timeout();

        let task = runtime.spawn(async move {
            let name = op.name();
            let result = match tokio::time::timeout(timeout, run_remote::<T, R>(&remote, &op)).await {
                Ok(result) => result,
                Err(_) => Err(ApiError::Timeout(timeout)),
            };
            match result {
                Ok(()) => {
                    debug!(resource = T::RESOURCE, op = name, "Remote sync confirmed");
                    true
                }
                Err(e) => {
                    warn!(
                        resource = T::RESOURCE,
                        op = name,
                        error = %e,
                        "Remote sync failed, keeping local change"
                    );
                    false
                }
            }
        });

        Mutation::pending(task)
    }
}

async fn run_remote<T, R>(remote: &R, op: &Op) -> std::result::Result<(), ApiError>
where
    T: Resource,
    R: RemoteSource<T>,
{
    match op {
        Op::SetFlag { id, flag, value } => remote.set_flag(id, *flag, *value).await,
        Op::Delete { id } => remote.delete(id).await,
        Op::BulkSetFlag { ids, flag, value } => remote.bulk_set_flag(ids, *flag, *value).await,
        Op::BulkDelete { ids } => remote.bulk_delete(ids).await,
        Op::ClearAll => remote.clear_all().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RemotePage;
    use crate::models::{Notification, NotificationKind, Priority};
    use async_trait::async_trait;
    use chrono::Utc;

    /// Backend that is never reached by these tests
    struct Offline;

    #[async_trait]
    impl RemoteSource<Notification> for Offline {
        async fn fetch_page(&self, _: &PageRequest) -> std::result::Result<RemotePage<Notification>, ApiError> {
            Err(ApiError::ServerError("offline".into()))
        }
        async fn set_flag(&self, _: &str, _: Flag, _: bool) -> std::result::Result<(), ApiError> {
            Err(ApiError::ServerError("offline".into()))
        }
        async fn delete(&self, _: &str) -> std::result::Result<(), ApiError> {
            Err(ApiError::ServerError("offline".into()))
        }
        async fn bulk_set_flag(&self, _: &[String], _: Flag, _: bool) -> std::result::Result<(), ApiError> {
            Err(ApiError::ServerError("offline".into()))
        }
        async fn bulk_delete(&self, _: &[String]) -> std::result::Result<(), ApiError> {
            Err(ApiError::ServerError("offline".into()))
        }
        async fn clear_all(&self) -> std::result::Result<(), ApiError> {
            Err(ApiError::ServerError("offline".into()))
        }
    }

    fn note(id: &str, read: bool) -> Notification {
        Notification {
            id: id.to_string(),
            title: id.to_string(),
            message: String::new(),
            kind: NotificationKind::Trip,
            category: String::new(),
            priority: Priority::Normal,
            is_read: read,
            is_important: false,
            created_at: Utc::now(),
            action_url: None,
        }
    }

    #[test]
    fn test_apply_local_narrows_bulk_ops() {
        let store = ResourceStore::new(Offline, StoreConfig::default());
        store.hydrate(vec![note("a", false), note("b", true)]);

        let op = Op::BulkSetFlag {
            ids: vec!["a".into(), "b".into(), "missing".into()],
            flag: Flag::Read,
            value: true,
        };
        assert_eq!(
            store.apply_local(&op),
            Some(Op::BulkSetFlag {
                ids: vec!["a".into()],
                flag: Flag::Read,
                value: true
            })
        );
        // Nothing left to change
        assert_eq!(store.apply_local(&op), None);
    }

    #[test]
    fn test_mutations_without_runtime_still_apply_locally() {
        let store = ResourceStore::new(Offline, StoreConfig::default());
        store.hydrate(vec![note("a", false)]);

        let mutation = store.mark_read("a");
        assert!(mutation.applied());
        assert!(!mutation.is_syncing());
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_unsupported_flag_is_noop() {
        let store = ResourceStore::new(Offline, StoreConfig::default());
        store.hydrate(vec![note("a", false)]);
        let op = Op::SetFlag {
            id: "a".into(),
            flag: Flag::Archived,
            value: true,
        };
        assert_eq!(store.apply_local(&op), None);
    }

    #[test]
    fn test_apply_local_publishes_to_subscribers() {
        let store = ResourceStore::new(Offline, StoreConfig::default());
        let mut summaries = store.summaries();
        store.hydrate(vec![note("a", false), note("b", false)]);
        assert!(summaries.has_changed().unwrap());
        assert_eq!(summaries.borrow_and_update().unread, 2);

        store.apply_local(&Op::Delete { id: "a".into() });
        assert_eq!(summaries.borrow_and_update().total, 1);
        assert_eq!(store.current_page().total, 1);
    }
}
