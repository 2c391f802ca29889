//! A point-in-time snapshot of a replica's observable state.
//!
//! Grounded in the teacher's `crate::metrics::RaftMetrics`
//! (`examples/simon-fu-async-raft/async-raft/src/metrics.rs`, referenced
//! from `core/mod.rs` as `self.report_metrics()` and surfaced to callers via
//! a `tokio::sync::watch::Receiver`). This crate has no background task to
//! publish metrics from, so [`RaftMetrics`] is instead a plain value
//! produced on demand by [`crate::driver::RaftDriver::metrics`] — a
//! synchronous getter rather than a watch channel.

use crate::fsm::Role;
use crate::membership::Configuration;
use crate::{GroupId, Index, NodeId, Term};

/// Snapshot of one replica's role, term, log position and membership at the
/// moment [`crate::driver::RaftDriver::metrics`] was called.
#[derive(Clone, Debug, PartialEq)]
pub struct RaftMetrics {
    pub id: NodeId,
    pub group_id: GroupId,
    pub role: Role,
    pub current_term: Term,
    pub current_leader: Option<NodeId>,
    pub last_log_index: Index,
    pub last_applied: Index,
    pub committed: Index,
    pub membership_config: Configuration,
}
