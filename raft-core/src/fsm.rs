//! The application state machine contract.
//!
//! Mirrors the apply/snapshot half of the teacher's `RaftStorage` trait
//! (`apply_entry_to_state_machine`, `do_log_compaction`, `finalize_snapshot_installation`),
//! split out into its own trait because this crate treats the FSM as a
//! collaborator distinct from the log/state storage — a host may well want
//! to apply to the state machine on a different thread than the one driving
//! [`crate::driver::RaftDriver`].

use anyhow::Result;
use bytes::Bytes;

use crate::membership::Configuration;
use crate::{Index, NodeId};

/// A role a node can occupy, reported to the FSM on every transition so it
/// can e.g. step up/down auxiliary services (lease renewal, read caches).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Follower,
    PreCandidate,
    Candidate,
    Leader,
}

/// The state machine a Raft group replicates commands into.
pub trait Fsm {
    /// Applies a committed, non-blank, non-conf-change entry's payload to
    /// the state machine. Called exactly once per index, in index order,
    /// even across restarts.
    fn apply_log(&mut self, index: Index, payload: &Bytes) -> Result<()>;

    /// Notifies the state machine that the effective cluster configuration
    /// changed at `index`, so it can update any membership-derived state
    /// (e.g. a read-routing table) it keeps.
    fn on_cluster_changed(&mut self, index: Index, conf: &Configuration) -> Result<()>;

    /// Produces an application-defined snapshot of state up to and
    /// including `index`, to be shipped to a lagging follower.
    fn get_snapshot(&self, index: Index) -> Result<Bytes>;

    /// Installs a snapshot received from the leader, discarding all prior
    /// application state.
    fn apply_snapshot(&mut self, index: Index, data: &Bytes) -> Result<()>;

    /// Called once the core has finished reconciling its own log/commit
    /// index against a just-installed snapshot, so the FSM can resume
    /// serving reads.
    fn on_restore_done(&mut self, index: Index) -> Result<()>;

    /// Called when an uncommitted entry at `from_index` is about to be
    /// overwritten by a conflicting append from a new leader, so the FSM can
    /// discard any speculative state it may have derived from it. This
    /// crate's own core only applies entries once committed, so the state
    /// machine itself never needs to roll anything back; the notification
    /// still fires on every such conflict so a host that applies ahead of
    /// commit (or just wants to observe discarded entries) has a defined hook.
    fn on_rollback(&mut self, from_index: Index) -> Result<()>;

    /// Called whenever this node's role changes.
    fn on_role_changed(&mut self, role: Role, leader: Option<NodeId>) -> Result<()>;
}
