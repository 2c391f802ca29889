//! The durable storage contracts this crate relies on but never implements.
//!
//! Synchronous counterparts to the teacher's `RaftStorage<D, R>` trait (see
//! `examples/simon-fu-async-raft/async-raft/src/storage.rs`). The teacher's
//! trait is `#[async_trait]` because its core runs each role as a tokio task
//! that awaits storage calls; this crate's core never blocks on I/O, so the
//! callouts here are plain, blocking `Result`-returning methods the host is
//! expected to have made cheap (e.g. backed by an in-process write-ahead
//! log, not a network round trip).

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::entry::Entry;
use crate::membership::Configuration;
use crate::{GroupId, Index, NodeId, Term};

/// Metadata describing a snapshot taken by the state machine.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub index: Index,
    pub term: Term,
    pub conf: Configuration,
}

/// The durable append-only log. Mirrors the teacher's storage-facing log
/// methods (`get_log_entries`, `append_entry_to_log`, `replicate_to_log`,
/// `delete_logs_from`), narrowed to: write,
/// read, commit (fsync/durability barrier), prune (snapshot compaction),
/// truncate (conflict resolution), last index.
pub trait LogStore {
    /// Appends `entries` to the end of the durable log. The caller
    /// guarantees `entries[0].index` is exactly one past the store's current
    /// last index.
    fn append(&mut self, entries: &[Entry]) -> Result<()>;

    /// Returns entries in `[lo, hi)`.
    fn entries(&self, lo: Index, hi: Index) -> Result<Vec<Entry>>;

    /// Returns the term of the entry at `index`, or `None` if it is outside
    /// the store's retained range.
    fn term(&self, index: Index) -> Result<Option<Term>>;

    /// The highest index currently in the store, or `0` if empty.
    fn last_index(&self) -> Result<Index>;

    /// The lowest index still retained (i.e. not yet compacted away).
    fn first_index(&self) -> Result<Index>;

    /// Durability barrier: once this returns, every entry appended so far is
    /// guaranteed to survive a crash.
    fn commit(&mut self) -> Result<()>;

    /// Discards all log entries with index `< index`, typically called
    /// after a snapshot has been installed covering that range.
    fn prune(&mut self, index: Index) -> Result<()>;

    /// Discards all log entries with index `>= index`, used when a new
    /// leader's entries conflict with what this follower had stored.
    fn truncate(&mut self, index: Index) -> Result<()>;
}

/// Per-node durable state the Raft core needs to survive a restart:
/// current term, the node voted for (if any) this term, and the last
/// applied index. Mirrors the teacher's `HardState`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ServerState {
    pub current_term: Term,
    pub voted_for: Option<NodeId>,
    pub last_applied: Index,
}

/// Durable cluster configuration, read back on restart to seed the progress
/// tracker without waiting to replay the whole log. Mirrors the teacher's
/// `InitialState::membership`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClusterState {
    pub conf: Configuration,
    /// Index of the log entry that produced this configuration, so startup
    /// can tell whether the log has moved past it.
    pub conf_index: Index,
}

/// Persists and restores the two small pieces of state in [`ServerState`]
/// and [`ClusterState`] that must survive independently of the bulk log.
pub trait StateManager {
    fn save_server_state(&mut self, state: &ServerState) -> Result<()>;
    fn read_server_state(&self) -> Result<Option<ServerState>>;

    fn save_cluster_state(&mut self, state: &ClusterState) -> Result<()>;
    fn read_cluster_state(&self) -> Result<Option<ClusterState>>;
}

/// What [`crate::driver::RaftDriver::start`] discovers about a node's
/// durable state before it can begin serving: the last-known hard state,
/// the last-known configuration, and the group/node identity it is starting
/// under. Mirrors the teacher's `InitialState`.
#[derive(Clone, Debug)]
pub struct InitialState {
    pub group_id: GroupId,
    pub this_node: NodeId,
    pub server_state: ServerState,
    pub cluster_state: ClusterState,
}
