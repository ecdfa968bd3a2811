//! Pure filter and sort engine over cached resources.
//!
//! The cache always holds the unfiltered superset; a `Filter` is reapplied on
//! every read so a changed filter can never be served from a stale result.

use std::borrow::Borrow;
use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::models::{Flag, Priority, Resource};
use crate::utils::{cmp_ignore_case, contains_ignore_case};

/// Exact-match predicate with an "all" wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selector<T> {
    #[default]
    All,
    Only(T),
}

impl<T> Selector<T> {
    pub fn admits<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        match self {
            Selector::All => true,
            Selector::Only(expected) => expected.borrow() == value,
        }
    }
}

impl Selector<String> {
    /// Parse a UI selector value; `"all"` and empty strings are the wildcard.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Selector::All
        } else {
            Selector::Only(trimmed.to_string())
        }
    }
}

impl<T> From<Option<T>> for Selector<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Selector::Only(v),
            None => Selector::All,
        }
    }
}

/// Read/flag status predicate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    All,
    Read,
    Unread,
    Important,
    Archived,
}

impl Status {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "" | "all" => Some(Status::All),
            "read" => Some(Status::Read),
            "unread" => Some(Status::Unread),
            "important" | "starred" => Some(Status::Important),
            "archived" => Some(Status::Archived),
            _ => None,
        }
    }

    fn admits<T: Resource>(&self, item: &T) -> bool {
        match self {
            Status::All => true,
            Status::Read => item.flag(Flag::Read) == Some(true),
            Status::Unread => item.flag(Flag::Read) == Some(false),
            Status::Important => item.flag(Flag::Important) == Some(true),
            Status::Archived => item.flag(Flag::Archived) == Some(true),
        }
    }
}

/// Describes the subset of cached items a consumer wants to see.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub search: Option<String>,
    pub category: Selector<String>,
    pub kind: Selector<String>,
    pub status: Status,
    pub priority: Selector<Priority>,
    /// Inclusive lower bound on `created_at`
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`
    pub date_to: Option<DateTime<Utc>>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Selector::parse(category);
        self
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = Selector::parse(kind);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Selector::Only(priority);
        self
    }

    pub fn with_date_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Lowercased, trimmed search query; `None` when there is nothing to match.
    fn normalized_query(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    fn admits<T: Resource>(&self, item: &T, query: Option<&str>) -> bool {
        if let Some(query) = query {
            if !item
                .search_fields()
                .iter()
                .any(|field| contains_ignore_case(field, query))
            {
                return false;
            }
        }

        let created = item.created_at();
        if self.date_from.is_some_and(|from| created < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| created > to) {
            return false;
        }

        self.category.admits(item.category())
            && self.kind.admits(item.kind())
            && self.priority.admits(&item.priority())
            && self.status.admits(item)
    }

    /// Check a single item against this filter
    pub fn matches<T: Resource>(&self, item: &T) -> bool {
        self.admits(item, self.normalized_query().as_deref())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Priority,
    Category,
    Title,
}

impl SortKey {
    /// Field name understood by the remote API
    pub fn wire_name(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "createdAt",
            SortKey::Priority => "priority",
            SortKey::Category => "category",
            SortKey::Title => "title",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "createdat" | "created" | "date" => Some(SortKey::CreatedAt),
            "priority" => Some(SortKey::Priority),
            "category" => Some(SortKey::Category),
            "title" | "subject" => Some(SortKey::Title),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn wire_name(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Sort settings; the default is newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    /// If already sorting by this key, flip direction;
    /// otherwise switch to this key ascending.
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == key {
            self.order = match self.order {
                SortOrder::Ascending => SortOrder::Descending,
                SortOrder::Descending => SortOrder::Ascending,
            };
        } else {
            self.key = key;
            self.order = SortOrder::Ascending;
        }
    }

    fn compare<T: Resource>(&self, a: &T, b: &T) -> Ordering {
        let cmp = match self.key {
            SortKey::CreatedAt => a.created_at().cmp(&b.created_at()),
            SortKey::Priority => a.priority().cmp(&b.priority()),
            SortKey::Category => cmp_ignore_case(a.category(), b.category()),
            SortKey::Title => cmp_ignore_case(a.title(), b.title()),
        };

        // Reverse the comparison, not the sequence, so ties keep input order
        match self.order {
            SortOrder::Ascending => cmp,
            SortOrder::Descending => cmp.reverse(),
        }
    }
}

/// Filter and sort `items`, returning a new sequence.
///
/// Deterministic for a given input: `Vec::sort_by` is stable, so items that
/// compare equal under `sort` stay in their original relative order.
pub fn apply<T: Resource>(items: &[T], filter: &Filter, sort: Sort) -> Vec<T> {
    let query = filter.normalized_query();
    let mut selected: Vec<T> = items
        .iter()
        .filter(|item| filter.admits(*item, query.as_deref()))
        .cloned()
        .collect();

    selected.sort_by(|a, b| sort.compare(a, b));
    selected
}
