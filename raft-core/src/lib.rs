//! A synchronous, single-group Raft consensus replication engine.
//!
//! This crate implements the role state machine, replicated log, progress
//! tracking, joint membership changes and message dispatch of a single Raft
//! replica group. It never performs I/O and never spawns a task: every public
//! entry point is a plain synchronous function that takes `&mut self` and
//! returns any messages the caller must deliver. The host process is
//! responsible for timers, the network transport, durable storage and
//! applying committed entries to a state machine; this crate only fixes the
//! contracts those collaborators must satisfy (see [`storage`] and [`fsm`]).

pub mod confchange;
pub mod config;
pub mod driver;
pub mod entry;
pub mod error;
pub mod fsm;
pub mod log;
pub mod membership;
pub mod message;
pub mod metrics;
pub mod progress;

mod core;

pub use config::Config;
pub use driver::RaftDriver;
pub use entry::{Entry, EntryKind, EntryPayload};
pub use error::{ConfChangeError, ProposeError, RaftError};
pub use fsm::Fsm;
pub use message::Message;
pub use metrics::RaftMetrics;
pub use storage::{InitialState, LogStore, StateManager};

pub mod storage;

/// Identifies a single node within a replica group.
pub type NodeId = u64;

/// Identifies the replica group a [`RaftDriver`] instance belongs to.
pub type GroupId = u64;

/// A Raft log index. `0` is the sentinel "no entry" value; the first real
/// log position is `1`.
pub type Index = u64;

/// A Raft election term. `0` means "no term has ever been observed".
pub type Term = u64;

/// Convenience alias for a compound (term, index) marker that uniquely
/// identifies a position in the log. Two entries with the same `LogId` are
/// guaranteed (by the Log Matching invariant) to have identical content.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, serde::Serialize, serde::Deserialize)]
pub struct LogId {
    pub term: Term,
    pub index: Index,
}

impl LogId {
    pub fn new(term: Term, index: Index) -> Self {
        Self { term, index }
    }
}

impl std::fmt::Display for LogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.term, self.index)
    }
}
