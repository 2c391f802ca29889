//! Error types returned by this crate's public API.

use thiserror::Error;

use crate::{Index, NodeId};

/// The four broad error kinds a single-group Raft engine can produce:
/// a protocol-level rejection (encoded as a reply message, never returned
/// here), a store error, a resource error, or a fatal invariant violation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RaftError {
    /// The requested index has already been compacted out of the log.
    #[error("index {0} has been compacted")]
    IndexCompacted(Index),

    /// The requested index is not yet present in the log.
    #[error("index {0} is not yet available")]
    IndexUnavailable(Index),

    /// The log store or state manager could not satisfy a read or write.
    #[error("storage error: {0}")]
    Store(String),

    /// This node is not the leader; `Option<NodeId>` is the last known leader, if any.
    #[error("this node is not the leader (last known leader: {0:?})")]
    NotLeader(Option<NodeId>),

    /// A request referenced a node id outside the current configuration
    /// , e.g. a leadership transfer
    /// target that is not a voter.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// A fatal invariant was violated. The driver transitions to a terminal
    /// state and refuses all further calls once this is raised.
    #[error("fatal raft invariant violation: {0}")]
    Fatal(String),
}

/// Errors returned from [`crate::driver::RaftDriver::propose`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProposeError {
    /// This node is not the leader.
    #[error("this node is not the leader (last known leader: {0:?})")]
    NotLeader(Option<NodeId>),

    /// The proposal was dropped, e.g. because a new leader was elected
    /// before it could be committed.
    #[error("proposal was dropped")]
    ProposalDropped,

    /// There is not enough room in the current batch/queue to accept the entry.
    #[error("not enough memory to encode or append entries")]
    NoMem,

    /// The driver is in a terminal, stopped state and can no longer accept proposals.
    #[error("raft driver is stopped")]
    Stopped,
}

/// Errors returned from [`crate::driver::RaftDriver::reconfig`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfChangeError {
    /// A configuration change is already in progress; only one may be
    /// in flight at a time.
    #[error("a configuration change is already in progress")]
    AlreadyInProgress,

    /// This node is not the leader.
    #[error("this node is not the leader (last known leader: {0:?})")]
    NotLeader(Option<NodeId>),

    /// The requested change referenced a node unknown to the current configuration.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The requested change set was empty or otherwise malformed.
    #[error("invalid configuration change: {0}")]
    Invalid(String),
}

/// A catch-all result alias used at trait boundaries with external
/// collaborators (log store, state manager, FSM), mirroring how the teacher's
/// `RaftStorage` trait returns `anyhow::Result<T>` rather than a crate-local
/// error type: these collaborators are free to fail for reasons this crate
/// cannot enumerate (disk full, corruption, etc).
pub type StoreResult<T> = anyhow::Result<T>;
