use std::fmt;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Boolean status flags a resource may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    Read,
    Important,
    Archived,
}

impl Flag {
    /// Path segment used by the remote API for this flag
    pub fn path_segment(&self) -> &'static str {
        match self {
            Flag::Read => "read",
            Flag::Important => "important",
            Flag::Archived => "archive",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "read" | "isread" => Some(Flag::Read),
            "important" | "isimportant" | "starred" | "isstarred" => Some(Flag::Important),
            "archive" | "archived" | "isarchived" => Some(Flag::Archived),
            _ => None,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Read => write!(f, "read"),
            Flag::Important => write!(f, "important"),
            Flag::Archived => write!(f, "archived"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    #[serde(alias = "medium")]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Normal,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record held by a [`ResourceStore`](crate::store::ResourceStore).
///
/// Implementors describe how their fields map onto the generic filter,
/// summary and fallback machinery. `id` must be unique within one store.
pub trait Resource: Clone + fmt::Debug + Send + Sync + 'static {
    /// Collection path on the remote API, e.g. `notifications`.
    const RESOURCE: &'static str;

    fn id(&self) -> &str;

    /// Current value of `flag`, or `None` if this resource has no such flag.
    fn flag(&self, flag: Flag) -> Option<bool>;

    /// Set `flag` and return its previous value. `None` means unsupported.
    fn set_flag(&mut self, flag: Flag, value: bool) -> Option<bool>;

    fn created_at(&self) -> DateTime<Utc>;

    fn category(&self) -> &str;

    fn kind(&self) -> &str;

    fn priority(&self) -> Priority;

    /// Text used for title sorting.
    fn title(&self) -> &str;

    /// Fields matched by free-text search.
    fn search_fields(&self) -> Vec<&str>;

    /// Build the `index`th synthetic record for offline display.
    fn synthesize(rng: &mut StdRng, index: usize, now: DateTime<Utc>) -> Self;
}
