use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Flag, Resource};

/// Aggregate counts derived from a store's cache.
///
/// Always recomputed from the cached items, never maintained incrementally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Summary {
    pub total: usize,
    pub unread: usize,
    pub important: usize,
    pub archived: usize,
    #[serde(rename = "byCategory")]
    pub by_category: BTreeMap<String, usize>,
    #[serde(rename = "byKind")]
    pub by_kind: BTreeMap<String, usize>,
}

impl Summary {
    pub fn from_items<T: Resource>(items: &[T]) -> Self {
        let mut summary = Summary {
            total: items.len(),
            ..Default::default()
        };

        for item in items {
            if item.flag(Flag::Read) == Some(false) {
                summary.unread += 1;
            }
            if item.flag(Flag::Important) == Some(true) {
                summary.important += 1;
            }
            if item.flag(Flag::Archived) == Some(true) {
                summary.archived += 1;
            }
            *summary
                .by_category
                .entry(item.category().to_string())
                .or_insert(0) += 1;
            *summary.by_kind.entry(item.kind().to_string()).or_insert(0) += 1;
        }

        summary
    }

    /// Badge count for unread items
    pub fn unread_count(&self) -> usize {
        self.unread
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Message, Notification, NotificationKind, Priority};
    use chrono::Utc;

    fn note(id: &str, kind: NotificationKind, read: bool) -> Notification {
        Notification {
            id: id.to_string(),
            title: id.to_string(),
            message: String::new(),
            kind,
            category: String::new(),
            priority: Priority::Normal,
            is_read: read,
            is_important: false,
            created_at: Utc::now(),
            action_url: None,
        }
    }

    #[test]
    fn test_counts_by_flag_and_category() {
        let items = vec![
            note("a", NotificationKind::Booking, false),
            note("b", NotificationKind::Trip, true),
            note("c", NotificationKind::Payment, false),
        ];
        let summary = Summary::from_items(&items);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.unread_count(), 2);
        assert_eq!(summary.by_category.get("transport"), Some(&2));
        assert_eq!(summary.by_category.get("billing"), Some(&1));
        assert_eq!(summary.by_kind.get("booking"), Some(&1));
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(Summary::from_items::<Message>(&[]), Summary::default());
    }
}
