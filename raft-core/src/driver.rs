//! The public facade consumed by the worker/dispatch layer 
//!
//! Grounded in the teacher's public `Raft<D,R,N,S>` handle
//! (`examples/simon-fu-async-raft/async-raft/src/raft.rs`), re-shaped from an
//! async handle that forwards every call across a channel to a tokio-actor
//! task into a direct synchronous facade over [`crate::core::Raft`], per
//! the design. Startup ordering (open the log, read server state, read cluster
//! state, rebuild the progress map, settle on an initial role) is grounded
//! in `examples/original_source/source/libs/sync/src/sync_raft.c`'s
//! `syncRaftStart`.

use crate::config::Config;
use crate::core::Raft;
use crate::entry::EntryPayload;
use crate::error::{ConfChangeError, ProposeError, RaftError};
use crate::fsm::Fsm;
use crate::log::RaftLog;
use crate::membership::{ConfChangeSingle, Configuration};
use crate::message::Message;
use crate::metrics::RaftMetrics;
use crate::storage::{ClusterState, LogStore, ServerState, StateManager};
use crate::{GroupId, Index, NodeId};

/// Binds a [`crate::fsm::Fsm`], [`crate::storage::LogStore`] and
/// [`crate::storage::StateManager`] to one running replica and exposes the
/// four calls a host ever needs to make: feed it a message, feed it a tick,
/// propose an entry, or reconfigure the cluster. Every call returns the
/// outbound messages (if any) the host must now deliver; there is no
/// internal queue to poll separately.
pub struct RaftDriver<S: LogStore, M: StateManager, F: Fsm> {
    raft: Raft<S, M, F>,
    stopped: bool,
}

impl<S: LogStore, M: StateManager, F: Fsm> RaftDriver<S, M, F> {
    /// Restores persisted [`ServerState`] and [`ClusterState`] (if any),
    /// rebuilds the progress tracker, and settles this replica on an
    /// initial role — `Follower` at the persisted term, or `Leader`
    /// immediately if this is the sole voter in a freshly bootstrapped
    /// single-node group (mirrors `syncRaftStart`'s special case).
    #[tracing::instrument(level = "info", skip(log_store, state_mgr, fsm))]
    pub fn start(
        group_id: GroupId,
        this_node: NodeId,
        config: Config,
        log_store: S,
        mut state_mgr: M,
        fsm: F,
    ) -> Result<Self, RaftError> {
        let log = RaftLog::new(log_store)?;
        let server_state = state_mgr
            .read_server_state()
            .map_err(|e| RaftError::Store(e.to_string()))?
            .unwrap_or_default();
        let cluster_state = state_mgr
            .read_cluster_state()
            .map_err(|e| RaftError::Store(e.to_string()))?
            .unwrap_or_default();
        let mut raft = Raft::new(group_id, this_node, config, log, state_mgr, fsm, Configuration::default());
        raft.restore(server_state, cluster_state)?;
        let applied = raft.log.applied();
        let _ = raft.fsm.on_restore_done(applied);
        Ok(Self { raft, stopped: false })
    }

    /// Dispatches one inbound message, returning whatever outbound messages
    /// it produced.
    pub fn step(&mut self, msg: Message) -> Vec<Message> {
        if self.stopped {
            return Vec::new();
        }
        self.raft.step(msg)
    }

    /// Advances one timer tick (election or heartbeat, depending on role).
    pub fn tick(&mut self) -> Vec<Message> {
        if self.stopped {
            return Vec::new();
        }
        self.raft.tick()
    }

    /// Proposes a client entry, returning the index it was appended at (the
    /// host's correlation key for the proposal — callers that need to match
    /// a request back up keep their own `index -> cookie` map rather than
    /// threading it through the FSM, since the FSM contract's `applyLog`
    /// only ever needs the committed index and payload to apply state
    /// deterministically) together with the outbound messages this call
    /// produced. Like `step`/`tick`, nothing is queued for a later call to
    /// flush.
    pub fn propose(&mut self, payload: impl Into<EntryPayload>, is_weak: bool) -> (Result<Index, ProposeError>, Vec<Message>) {
        if self.stopped {
            return (Err(ProposeError::Stopped), Vec::new());
        }
        let (index, out) = self.raft.propose(payload.into(), is_weak);
        (index.ok_or(ProposeError::NotLeader(self.raft.leader_id)), out)
    }

    /// Proposes a joint-consensus membership change, returning the index it
    /// was appended at together with the outbound messages this call
    /// produced.
    pub fn reconfig(&mut self, ops: Vec<ConfChangeSingle>) -> (Result<Index, ConfChangeError>, Vec<Message>) {
        if self.stopped {
            return (Err(ConfChangeError::NotLeader(self.raft.leader_id)), Vec::new());
        }
        self.raft.propose_conf_change(ops)
    }

    /// Begins transferring leadership to `target`, returning any outbound
    /// `TimeoutNow` this call produced.
    pub fn transfer_leadership(&mut self, target: NodeId) -> (Result<(), RaftError>, Vec<Message>) {
        if self.stopped {
            return (Err(RaftError::NotLeader(self.raft.leader_id)), Vec::new());
        }
        self.raft.transfer_leadership(target)
    }

    /// Stops this replica. After this call every other method is a no-op.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.raft.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_leader(&self) -> bool {
        self.raft.is_leader()
    }

    /// A point-in-time snapshot of this replica's observable state.
    pub fn metrics(&self) -> RaftMetrics {
        RaftMetrics {
            id: self.raft.id,
            group_id: self.raft.group_id,
            role: self.raft.role.as_fsm_role(),
            current_term: self.raft.current_term,
            current_leader: self.raft.leader_id,
            last_log_index: self.raft.log.last_index(),
            last_applied: self.raft.log.applied(),
            committed: self.raft.log.committed(),
            membership_config: self.raft.tracker.conf().clone(),
        }
    }

    /// A handle to the state machine for testing purposes, mirroring the
    /// teacher's `RaftStorageDebug::get_state_machine`
    /// (`examples/simon-fu-async-raft/async-raft/src/storage.rs`).
    pub fn debug_fsm(&self) -> &F {
        &self.raft.fsm
    }

    /// A handle to the durable log store for testing purposes, mirroring
    /// the teacher's `RaftStorageDebug::read_hard_state`.
    pub fn debug_log_store(&self) -> &S {
        self.raft.log.store()
    }
}
