//! Leadership transfer.
//!
//! No teacher counterpart was retrieved in the pack (`async-raft` never grew
//! this feature); modeled in the naming idiom of `core/mod.rs`, following
//! etcd-raft's `transferLeader` algorithm: the
//! leader withholds new proposals, waits for the target to catch up, then
//! sends it a forced, lease-bypassing `TimeoutNow`.

use tracing::{info, warn};

use crate::core::{Raft, Role};
use crate::error::RaftError;
use crate::fsm::Fsm;
use crate::message::MessageBody;
use crate::storage::{LogStore, StateManager};
use crate::NodeId;

impl<S: LogStore, M: StateManager, F: Fsm> Raft<S, M, F> {
    /// Begins transferring leadership to `target`. Returns an error if this
    /// node isn't the leader or `target` isn't a voter in the current
    /// configuration, alongside whatever `TimeoutNow` the call produced if
    /// `target` was already caught up. Transfer completes asynchronously
    /// otherwise: this call only arms it, and [`Raft::tick`]/[`Raft::step`]
    /// carry it forward.
    pub fn transfer_leadership(&mut self, target: NodeId) -> (Result<(), RaftError>, Vec<crate::message::Message>) {
        if !matches!(&self.role, Role::Leader(_)) {
            return (Err(RaftError::NotLeader(self.leader_id)), Vec::new());
        }
        if !self.tracker.conf().contains_voter(target) {
            return (Err(RaftError::UnknownNode(target)), Vec::new());
        }
        if target == self.id {
            // Already the leader; nothing to do.
            return (Ok(()), Vec::new());
        }
        info!(node = self.id, %target, "starting leadership transfer");
        if let Role::Leader(s) = &mut self.role {
            s.transferring_to = Some(target);
            s.transfer_elapsed = 0;
        }
        if self.tracker.get(target).map(|p| p.matched_index) == Some(self.log.last_index()) {
            self.send_timeout_now(target);
        }
        (Ok(()), std::mem::take(&mut self.out))
    }

    /// Aborts an in-progress transfer, e.g. because the target left the
    /// configuration or stepped away from its catch-up point.
    pub(crate) fn abort_transfer(&mut self) {
        if let Role::Leader(s) = &mut self.role {
            if let Some(target) = s.transferring_to.take() {
                warn!(node = self.id, %target, "aborting leadership transfer");
            }
            s.transfer_elapsed = 0;
        }
    }

    /// Called after every successful replication progress update: once the
    /// transfer target's log is fully caught up, fires the forced election
    /// immediately instead of waiting for the next tick.
    pub(crate) fn maybe_send_timeout_now(&mut self) {
        let target = match &self.role {
            Role::Leader(s) => s.transferring_to,
            _ => None,
        };
        let target = match target {
            Some(t) => t,
            None => return,
        };
        if !self.tracker.conf().contains_voter(target) {
            self.abort_transfer();
            return;
        }
        let caught_up = self.tracker.get(target).map(|p| p.matched_index == self.log.last_index()).unwrap_or(false);
        if caught_up {
            self.send_timeout_now(target);
        }
    }

    fn send_timeout_now(&mut self, target: NodeId) {
        info!(node = self.id, %target, "transfer target caught up, sending TimeoutNow");
        self.send(target, MessageBody::TimeoutNow);
    }
}
