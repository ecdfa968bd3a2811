//! Data models for the resources held in fleetcache stores.
//!
//! - `Resource`: the trait every cached record implements
//! - `Flag`, `Priority`: shared status and ordering vocabulary
//! - `Notification`: customer/admin portal notifications
//! - `Message`: support inbox messages

pub mod message;
pub mod notification;
pub mod resource;

pub use message::Message;
pub use notification::{Notification, NotificationKind};
pub use resource::{Flag, Priority, Resource};
