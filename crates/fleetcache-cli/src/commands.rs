//! Command argument types and command execution.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use fleetcache_core::utils::truncate;
use fleetcache_core::{
    ApiClient, Config, Filter, Flag, Message, MessageStore, Notification, NotificationStore, Page,
    RemoteSource, Resource, ResourceStore, Sort, Status, Summary, DEFAULT_PAGE_SIZE,
};

/// Page size used when a command needs to find one item by id
const LOOKUP_PAGE_SIZE: usize = 100;

/// Title column width for `--plain` output
const TITLE_WIDTH: usize = 48;

#[derive(Debug, Parser)]
#[command(name = "fleetcache")]
#[command(about = "Cached access to the fleet portal's notifications and messages")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List one page of a resource
    #[command(alias = "ls")]
    List {
        resource: ResourceKind,
        #[command(flatten)]
        args: ListArgs,
    },
    /// Show an item and mark it read
    Read { resource: ResourceKind, id: String },
    /// Delete an item
    #[command(alias = "rm")]
    Delete { resource: ResourceKind, id: String },
    /// Counts for one resource, or both when omitted
    Summary { resource: Option<ResourceKind> },
    /// Delete every item of a resource
    Clear { resource: ResourceKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    #[value(alias = "notification")]
    Notifications,
    #[value(alias = "message")]
    Messages,
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct ListArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub page: u64,
    /// Items per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..))]
    pub size: u64,
    /// Case-insensitive text search
    #[arg(long)]
    pub search: Option<String>,
    /// Only unread items
    #[arg(long)]
    pub unread: bool,
    /// Only items created on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub since: Option<DateTime<Utc>>,
    /// Bypass the cache for the first page
    #[arg(long)]
    pub refresh: bool,
    /// One line per item instead of JSON
    #[arg(long)]
    pub plain: bool,
}

impl ListArgs {
    pub fn filter(&self) -> Filter {
        let mut filter = Filter::new().with_date_range(self.since, None);
        if let Some(query) = &self.search {
            filter = filter.with_search(query.as_str());
        }
        if self.unread {
            filter = filter.with_status(Status::Unread);
        }
        filter
    }
}

/// Parse a `YYYY-MM-DD` date as midnight UTC
pub fn parse_date(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD", value))
}

// ============================================================================
// Execution
// ============================================================================

/// Stores for every resource, sharing one HTTP client.
pub struct Stores {
    pub notifications: NotificationStore,
    pub messages: MessageStore,
}

impl Stores {
    pub fn new(client: ApiClient, config: &Config) -> Self {
        let client = Arc::new(client);
        Self {
            notifications: ResourceStore::with_shared_remote(
                client.clone(),
                config.store(Notification::RESOURCE),
            ),
            messages: ResourceStore::with_shared_remote(client, config.store(Message::RESOURCE)),
        }
    }
}

pub async fn run(command: Commands, stores: &Stores) -> Result<()> {
    match command {
        Commands::List { resource, args } => match resource {
            ResourceKind::Notifications => list(&stores.notifications, &args).await,
            ResourceKind::Messages => list(&stores.messages, &args).await,
        },
        Commands::Read { resource, id } => match resource {
            ResourceKind::Notifications => read(&stores.notifications, &id).await,
            ResourceKind::Messages => read(&stores.messages, &id).await,
        },
        Commands::Delete { resource, id } => match resource {
            ResourceKind::Notifications => delete(&stores.notifications, &id).await,
            ResourceKind::Messages => delete(&stores.messages, &id).await,
        },
        Commands::Summary { resource } => match resource {
            Some(ResourceKind::Notifications) => print_json(&summary(&stores.notifications).await),
            Some(ResourceKind::Messages) => print_json(&summary(&stores.messages).await),
            None => {
                let (notifications, messages) = futures::join!(
                    summary(&stores.notifications),
                    summary(&stores.messages)
                );
                print_json(&json!({ "notifications": notifications, "messages": messages }))
            }
        },
        Commands::Clear { resource } => match resource {
            ResourceKind::Notifications => clear(&stores.notifications).await,
            ResourceKind::Messages => clear(&stores.messages).await,
        },
    }
}

pub async fn list<T, R>(store: &ResourceStore<T, R>, args: &ListArgs) -> Result<()>
where
    T: Resource + Serialize,
    R: RemoteSource<T>,
{
    let page_number = args.page as usize;
    let page = store
        .load(
            args.filter(),
            Sort::default(),
            page_number,
            args.size as usize,
            args.refresh && page_number == 1,
        )
        .await;
    info!(resource = T::RESOURCE, shown = page.len(), total = page.total, "Listed");

    if args.plain {
        print_plain(&page, &store.cache_age());
        Ok(())
    } else {
        print_json(&page)
    }
}

fn print_plain<T: Resource>(page: &Page<T>, age: &str) {
    for item in &page.items {
        let marker = if item.flag(Flag::Read) == Some(false) { '*' } else { ' ' };
        println!(
            "{} {:<28} {:<8} {}",
            marker,
            truncate(item.id(), 28),
            item.priority().as_str(),
            truncate(item.title(), TITLE_WIDTH)
        );
    }
    println!(
        "-- page {} of {} items, cached {}{}",
        page.page,
        page.total,
        age,
        if page.has_more { ", more available" } else { "" }
    );
}

/// Load enough of the collection to find `id` in the cache
async fn lookup<T: Resource, R: RemoteSource<T>>(store: &ResourceStore<T, R>, id: &str) -> Result<T> {
    store
        .load(Filter::default(), Sort::default(), 1, LOOKUP_PAGE_SIZE, false)
        .await;
    store
        .try_get(id)
        .with_context(|| format!("Cannot find {} '{}'", T::RESOURCE, id))
}

pub async fn read<T, R>(store: &ResourceStore<T, R>, id: &str) -> Result<()>
where
    T: Resource + Serialize,
    R: RemoteSource<T>,
{
    lookup(store, id).await?;
    let mutation = store.mark_read(id);
    let changed = mutation.applied();
    let synced = mutation.settle().await;
    debug!(resource = T::RESOURCE, id, changed, synced, "Marked read");

    let item = store.try_get(id)?;
    print_json(&json!({ "item": item, "changed": changed, "synced": synced }))
}

pub async fn delete<T: Resource, R: RemoteSource<T>>(store: &ResourceStore<T, R>, id: &str) -> Result<()> {
    lookup(store, id).await?;
    let synced = store.delete(id).settle().await;
    print_json(&json!({ "id": id, "deleted": true, "synced": synced }))
}

pub async fn summary<T: Resource, R: RemoteSource<T>>(store: &ResourceStore<T, R>) -> Summary {
    store
        .load(Filter::default(), Sort::default(), 1, LOOKUP_PAGE_SIZE, false)
        .await;
    store.summary()
}

pub async fn clear<T: Resource, R: RemoteSource<T>>(store: &ResourceStore<T, R>) -> Result<()> {
    let synced = store.clear_all().settle().await;
    print_json(&json!({ "resource": T::RESOURCE, "cleared": true, "synced": synced }))
}

pub fn print_json<S: Serialize + ?Sized>(value: &S) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_is_midnight_utc() {
        let date = parse_date("2024-03-01").unwrap();
        assert_eq!(date.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert!(parse_date("03/01/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn test_list_args_build_filter() {
        let args = ListArgs {
            page: 1,
            size: 20,
            search: Some("refund".into()),
            unread: true,
            since: parse_date("2024-03-01").ok(),
            refresh: false,
            plain: false,
        };
        let filter = args.filter();
        assert_eq!(filter.search.as_deref(), Some("refund"));
        assert_eq!(filter.status, Status::Unread);
        assert_eq!(filter.date_from, args.since);
        assert_eq!(filter.date_to, None);
    }

    fn list_args(argv: &[&str]) -> (ResourceKind, ListArgs) {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::List { resource, args } => (resource, args),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_list_defaults() {
        let (resource, args) = list_args(&["fleetcache", "list", "notifications"]);
        assert_eq!(resource, ResourceKind::Notifications);
        assert_eq!(args.page, 1);
        assert_eq!(args.size, DEFAULT_PAGE_SIZE as u64);
        assert_eq!(args.search, None);
        assert!(!args.unread && !args.refresh && !args.plain);
        assert_eq!(args.since, None);
    }

    #[test]
    fn test_list_with_every_flag() {
        let (resource, args) = list_args(&[
            "fleetcache", "ls", "message", "--page", "3", "--size", "5", "--search", "invoice",
            "--unread", "--since", "2024-03-01", "--refresh", "--plain",
        ]);
        assert_eq!(resource, ResourceKind::Messages);
        assert_eq!((args.page, args.size), (3, 5));
        assert_eq!(args.search.as_deref(), Some("invoice"));
        assert!(args.unread && args.refresh && args.plain);
        assert_eq!(args.since, parse_date("2024-03-01").ok());
    }

    #[test]
    fn test_bad_input_is_rejected() {
        for argv in [
            vec!["fleetcache", "list", "trips"],
            vec!["fleetcache", "list", "messages", "--page", "0"],
            vec!["fleetcache", "list", "messages", "--size", "ten"],
            vec!["fleetcache", "list", "messages", "--since", "yesterday"],
            vec!["fleetcache", "read", "messages"],
            vec!["fleetcache"],
        ] {
            assert!(Cli::try_parse_from(argv.iter().copied()).is_err(), "accepted {argv:?}");
        }
    }

    #[test]
    fn test_item_commands() {
        let cli = Cli::try_parse_from(["fleetcache", "rm", "notifications", "n-7"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Delete { resource: ResourceKind::Notifications, ref id } if id == "n-7"
        ));

        let cli = Cli::try_parse_from(["fleetcache", "read", "messages", "m-1"]).unwrap();
        assert!(matches!(cli.command, Commands::Read { resource: ResourceKind::Messages, .. }));

        let cli = Cli::try_parse_from(["fleetcache", "summary"]).unwrap();
        assert!(matches!(cli.command, Commands::Summary { resource: None }));

        let cli = Cli::try_parse_from(["fleetcache", "clear", "messages"]).unwrap();
        assert!(matches!(cli.command, Commands::Clear { resource: ResourceKind::Messages }));
    }
}
