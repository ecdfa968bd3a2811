use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::resource::{Flag, Priority, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Booking,
    Payment,
    Trip,
    System,
    Promotion,
    /// Any type this client does not know yet
    #[serde(other)]
    Other,
}

impl NotificationKind {
    fn unknown() -> Self {
        NotificationKind::Other
    }

    pub const ALL: [NotificationKind; 5] = [
        NotificationKind::Booking,
        NotificationKind::Payment,
        NotificationKind::Trip,
        NotificationKind::System,
        NotificationKind::Promotion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Booking => "booking",
            NotificationKind::Payment => "payment",
            NotificationKind::Trip => "trip",
            NotificationKind::System => "system",
            NotificationKind::Promotion => "promotion",
            NotificationKind::Other => "other",
        }
    }

    /// Category a notification of this kind is filed under
    pub fn default_category(&self) -> &'static str {
        match self {
            NotificationKind::Booking | NotificationKind::Trip => "transport",
            NotificationKind::Payment => "billing",
            NotificationKind::System => "account",
            NotificationKind::Promotion => "marketing",
            NotificationKind::Other => "general",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Booking => write!(f, "Booking"),
            NotificationKind::Payment => write!(f, "Payment"),
            NotificationKind::Trip => write!(f, "Trip"),
            NotificationKind::System => write!(f, "System"),
            NotificationKind::Promotion => write!(f, "Promotion"),
            NotificationKind::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Notification {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default = "NotificationKind::unknown")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(rename = "isRead", alias = "read", default)]
    pub is_read: bool,
    #[serde(rename = "isImportant", alias = "important", default)]
    pub is_important: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "actionUrl", default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

impl Notification {
    /// Category, falling back to the kind's default when the server sent none
    pub fn effective_category(&self) -> &str {
        if self.category.is_empty() {
            self.kind.default_category()
        } else {
            &self.category
        }
    }

    pub fn formatted_date(&self) -> String {
        self.created_at.format("%b %d, %Y %H:%M").to_string()
    }
}

const BOOKING_ROUTES: [&str; 6] = [
    "Lagos - Abuja",
    "Accra - Kumasi",
    "Nairobi - Mombasa",
    "Ibadan - Lagos",
    "Kano - Kaduna",
    "Enugu - Port Harcourt",
];

impl Resource for Notification {
    const RESOURCE: &'static str = "notifications";

    fn id(&self) -> &str {
        &self.id
    }

    fn flag(&self, flag: Flag) -> Option<bool> {
        match flag {
            Flag::Read => Some(self.is_read),
            Flag::Important => Some(self.is_important),
            Flag::Archived => None,
        }
    }

    fn set_flag(&mut self, flag: Flag, value: bool) -> Option<bool> {
        let slot = match flag {
            Flag::Read => &mut self.is_read,
            Flag::Important => &mut self.is_important,
            Flag::Archived => return None,
        };
        Some(std::mem::replace(slot, value))
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn category(&self) -> &str {
        self.effective_category()
    }

    fn kind(&self) -> &str {
        self.kind.as_str()
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.message, self.effective_category()]
    }

    fn synthesize(rng: &mut StdRng, index: usize, now: DateTime<Utc>) -> Self {
        let kind = NotificationKind::ALL[rng.gen_range(0..NotificationKind::ALL.len())];
        let route = BOOKING_ROUTES[rng.gen_range(0..BOOKING_ROUTES.len())];
        let reference = rng.gen_range(10_000..100_000);

        let (title, message) = match kind {
            NotificationKind::Booking => (
                "Booking confirmed".to_string(),
                format!("Your seat on {} is confirmed (ref TRP-{}).", route, reference),
            ),
            NotificationKind::Payment => (
                "Payment received".to_string(),
                format!("We received your payment for booking TRP-{}.", reference),
            ),
            NotificationKind::Trip => (
                "Trip update".to_string(),
                format!("Departure time for {} has changed.", route),
            ),
            NotificationKind::System => (
                "Account notice".to_string(),
                "Your profile details were updated.".to_string(),
            ),
            NotificationKind::Promotion | NotificationKind::Other => (
                "Weekend offer".to_string(),
                format!("Save on {} trips this weekend.", route),
            ),
        };

        let minutes_ago = rng.gen_range(0..7 * 24 * 60);

        Notification {
            id: format!("fallback-notification-{}", index + 1),
            title,
            message,
            kind,
            category: kind.default_category().to_string(),
            priority: Priority::ALL[rng.gen_range(0..Priority::ALL.len())],
            is_read: rng.gen_bool(0.4),
            is_important: rng.gen_bool(0.2),
            created_at: now - Duration::minutes(minutes_ago),
            action_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_deserialize_wire_notification() {
        let json = r#"{
            "id": "n-1",
            "title": "Booking confirmed",
            "message": "Seat 4A",
            "type": "booking",
            "priority": "high",
            "isRead": false,
            "isImportant": true,
            "createdAt": "2024-03-01T08:30:00Z"
        }"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.id, "n-1");
        assert_eq!(n.kind, NotificationKind::Booking);
        assert_eq!(n.priority, Priority::High);
        assert!(n.is_important);
        assert_eq!(n.category(), "transport");
        assert_eq!(n.created_at.to_rfc3339(), "2024-03-01T08:30:00+00:00");
    }

    #[test]
    fn test_deserialize_accepts_short_flag_names_and_medium_priority() {
        let json = r#"{
            "id": "n-2",
            "title": "t",
            "message": "m",
            "type": "system",
            "priority": "medium",
            "read": true,
            "createdAt": "2024-03-01T08:30:00.000+01:00"
        }"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert!(n.is_read);
        assert!(!n.is_important);
        assert_eq!(n.priority, Priority::Normal);
    }

    #[test]
    fn test_unknown_type_and_missing_text_still_deserialize() {
        let json = r#"{
            "id": "n-3",
            "type": "alert",
            "createdAt": "2024-03-01T08:30:00Z"
        }"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.kind, NotificationKind::Other);
        assert_eq!(n.kind(), "other");
        assert_eq!(n.category(), "general");
        assert!(n.title.is_empty() && n.message.is_empty());

        let untyped: Notification =
            serde_json::from_str(r#"{"id": "n-4", "createdAt": "2024-03-01T08:30:00Z"}"#).unwrap();
        assert_eq!(untyped.kind, NotificationKind::Other);
    }

    #[test]
    fn test_set_flag_returns_previous_value() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut n = Notification::synthesize(&mut rng, 0, Utc::now());
        n.is_read = false;
        assert_eq!(n.set_flag(Flag::Read, true), Some(false));
        assert_eq!(n.set_flag(Flag::Read, true), Some(true));
        assert_eq!(n.set_flag(Flag::Archived, true), None);
        assert_eq!(n.flag(Flag::Archived), None);
    }

    #[test]
    fn test_synthesize_is_deterministic_for_seed() {
        let now = Utc::now();
        let a = Notification::synthesize(&mut StdRng::seed_from_u64(7), 3, now);
        let b = Notification::synthesize(&mut StdRng::seed_from_u64(7), 3, now);
        assert_eq!(a, b);
        assert_eq!(a.id, "fallback-notification-4");
        assert!(a.created_at <= now);
    }
}
