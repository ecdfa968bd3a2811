#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use parking_lot::Mutex;

use fleetcache_core::{
    paginate, ApiError, Flag, Notification, NotificationKind, PageRequest, Priority, RemotePage,
    RemoteSource,
};

/// One scripted answer to a fetch, consumed in call order.
pub enum Scripted<T> {
    Items { items: Vec<T>, delay: Duration },
    Fail { delay: Duration },
}

/// In-memory backend with call counting and scripted responses.
pub struct MockRemote<T> {
    items: Mutex<Vec<T>>,
    scripted: Mutex<VecDeque<Scripted<T>>>,
    fail_fetches: AtomicBool,
    fail_mutations: AtomicBool,
    fetches: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl<T: Clone> MockRemote<T> {
    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
            scripted: Mutex::new(VecDeque::new()),
            fail_fetches: AtomicBool::new(false),
            fail_mutations: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        let remote = Self::with_items(Vec::new());
        remote.set_fail_fetches(true);
        remote.set_fail_mutations(true);
        remote
    }

    pub fn set_items(&self, items: Vec<T>) {
        *self.items.lock() = items;
    }

    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    pub fn push(&self, response: Scripted<T>) {
        self.scripted.lock().push_back(response);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    fn record(&self, entry: String) -> Result<(), ApiError> {
        self.log.lock().push(entry);
        if self.fail_mutations.load(Ordering::SeqCst) {
            Err(ApiError::ServerError("mutation rejected".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<T> RemoteSource<T> for MockRemote<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn fetch_page(&self, request: &PageRequest) -> Result<RemotePage<T>, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let scripted = self.scripted.lock().pop_front();
        match scripted {
            Some(Scripted::Items { items, delay }) => {
                tokio::time::sleep(delay).await;
                let total = items.len();
                return Ok(RemotePage {
                    items,
                    total,
                    page: request.page,
                    page_size: request.page_size,
                    has_more: false,
                });
            }
            Some(Scripted::Fail { delay }) => {
                tokio::time::sleep(delay).await;
                return Err(ApiError::ServerError("scripted failure".into()));
            }
            None => {}
        }

        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(ApiError::ServerError("backend down".into()));
        }

        let items = self.items.lock().clone();
        let page = paginate(&items, request.page, request.page_size);
        Ok(RemotePage {
            items: page.items,
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            has_more: page.has_more,
        })
    }

    async fn set_flag(&self, id: &str, flag: Flag, value: bool) -> Result<(), ApiError> {
        self.record(format!("set_flag {} {} {}", id, flag, value))
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.record(format!("delete {}", id))
    }

    async fn bulk_set_flag(&self, ids: &[String], flag: Flag, value: bool) -> Result<(), ApiError> {
        self.record(format!("bulk_set_flag {} {} {}", ids.join(","), flag, value))
    }

    async fn bulk_delete(&self, ids: &[String]) -> Result<(), ApiError> {
        self.record(format!("bulk_delete {}", ids.join(",")))
    }

    async fn clear_all(&self) -> Result<(), ApiError> {
        self.record("clear_all".to_string())
    }
}

/// A notification created `age_hours` before a fixed instant.
pub fn notification(id: &str, is_read: bool, age_hours: i64) -> Notification {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Notification {
        id: id.to_string(),
        title: format!("Trip update {}", id),
        message: format!("Departure changed for {}", id),
        kind: NotificationKind::Trip,
        category: String::new(),
        priority: Priority::Normal,
        is_read,
        is_important: false,
        created_at: base - ChronoDuration::hours(age_hours),
        action_url: None,
    }
}

/// `count` notifications, newest first, ids `n1..=n{count}`, alternating read state.
pub fn notifications(count: usize) -> Vec<Notification> {
    (1..=count)
        .map(|i| notification(&format!("n{}", i), i % 2 == 0, i as i64))
        .collect()
}
