use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::resource::{Flag, Priority, Resource};

/// A support/inbox message between a customer and the operator desk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Message {
    pub id: String,
    #[serde(alias = "from", default)]
    pub sender: String,
    #[serde(default)]
    pub subject: String,
    #[serde(alias = "content", default)]
    pub body: String,
    #[serde(default = "Message::default_category")]
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(rename = "isRead", alias = "read", default)]
    pub is_read: bool,
    #[serde(rename = "isStarred", alias = "isImportant", default)]
    pub is_starred: bool,
    #[serde(rename = "isArchived", alias = "archived", default)]
    pub is_archived: bool,
    #[serde(rename = "createdAt", alias = "sentAt")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn default_category() -> String {
        "general".to_string()
    }

    /// First line of the body, for list previews
    pub fn preview(&self) -> &str {
        self.body.lines().next().unwrap_or("")
    }
}

const SENDERS: [&str; 5] = [
    "Support Desk",
    "Billing Team",
    "Fleet Operations",
    "Driver Relations",
    "Customer Care",
];

const SUBJECTS: [(&str, &str); 5] = [
    ("support", "Re: refund request"),
    ("billing", "Invoice available"),
    ("operations", "Vehicle reassignment"),
    ("support", "Lost luggage report"),
    ("general", "Welcome aboard"),
];

impl Resource for Message {
    const RESOURCE: &'static str = "messages";

    fn id(&self) -> &str {
        &self.id
    }

    fn flag(&self, flag: Flag) -> Option<bool> {
        Some(match flag {
            Flag::Read => self.is_read,
            Flag::Important => self.is_starred,
            Flag::Archived => self.is_archived,
        })
    }

    fn set_flag(&mut self, flag: Flag, value: bool) -> Option<bool> {
        let slot = match flag {
            Flag::Read => &mut self.is_read,
            Flag::Important => &mut self.is_starred,
            Flag::Archived => &mut self.is_archived,
        };
        Some(std::mem::replace(slot, value))
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn kind(&self) -> &str {
        "message"
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn title(&self) -> &str {
        &self.subject
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.sender, &self.subject, &self.body]
    }

    fn synthesize(rng: &mut StdRng, index: usize, now: DateTime<Utc>) -> Self {
        let (category, subject) = SUBJECTS[rng.gen_range(0..SUBJECTS.len())];
        let sender = SENDERS[rng.gen_range(0..SENDERS.len())];
        let hours_ago = rng.gen_range(0..14 * 24);

        Message {
            id: format!("fallback-message-{}", index + 1),
            sender: sender.to_string(),
            subject: subject.to_string(),
            body: format!("{} regarding ticket #{}.", subject, rng.gen_range(1000..10_000)),
            category: category.to_string(),
            priority: Priority::ALL[rng.gen_range(0..Priority::ALL.len())],
            is_read: rng.gen_bool(0.5),
            is_starred: rng.gen_bool(0.15),
            is_archived: false,
            created_at: now - Duration::hours(hours_ago),
        }
    }
}
