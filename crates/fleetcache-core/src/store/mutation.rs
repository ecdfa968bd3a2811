use tokio::task::JoinHandle;

use crate::models::Flag;

/// A change to a store's items.
///
/// Applied locally first by [`ResourceStore::apply_local`](super::ResourceStore::apply_local),
/// then sent to the backend by [`ResourceStore::sync_remote`](super::ResourceStore::sync_remote).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    SetFlag { id: String, flag: Flag, value: bool },
    Delete { id: String },
    BulkSetFlag { ids: Vec<String>, flag: Flag, value: bool },
    BulkDelete { ids: Vec<String> },
    ClearAll,
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::SetFlag { .. } => "set_flag",
            Op::Delete { .. } => "delete",
            Op::BulkSetFlag { .. } => "bulk_set_flag",
            Op::BulkDelete { .. } => "bulk_delete",
            Op::ClearAll => "clear_all",
        }
    }
}

/// Handle returned by every store mutation.
///
/// The local change is already visible when the handle is returned. Dropping
/// the handle leaves the remote sync running in the background.
#[derive(Debug)]
pub struct Mutation {
    applied: bool,
    remote: Option<JoinHandle<bool>>,
}

impl Mutation {
    pub(crate) fn local_only(applied: bool) -> Self {
        Self {
            applied,
            remote: None,
        }
    }

    pub(crate) fn pending(task: JoinHandle<bool>) -> Self {
        Self {
            applied: true,
            remote: Some(task),
        }
    }

    /// Whether the local cache changed
    pub fn applied(&self) -> bool {
        self.applied
    }

    /// Whether a remote sync was dispatched
    pub fn is_syncing(&self) -> bool {
        self.remote.is_some()
    }

    /// Wait for the remote sync. Returns `true` only if the backend confirmed it.
    ///
    /// A `false` result never rolls anything back; the local change stands.
    pub async fn settle(self) -> bool {
        match self.remote {
            Some(task) => task.await.unwrap_or(false),
            None => false,
        }
    }
}
