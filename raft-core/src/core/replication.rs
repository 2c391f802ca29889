//! Leader append/heartbeat/snapshot send path and the matching follower-side
//! handlers, driven synchronously off the [`crate::progress::tracker::ProgressTracker`]
//! instead of the teacher's per-follower `ReplicationCore` tokio task
//! (`examples/simon-fu-async-raft/async-raft/src/replication/mod.rs`). Every
//! "send a message to a follower" the teacher does by pushing onto an mpsc
//! channel happens here by pushing onto `self.out` instead.

use tracing::{debug, warn};

use crate::core::Raft;
use crate::fsm::Fsm;
use crate::message::{
    AppendEntriesRequest, AppendEntriesResponse, ConflictOpt, HeartbeatRequest, HeartbeatResponse, InstallSnapshotRequest,
    InstallSnapshotResponse, MessageBody,
};
use crate::storage::{LogStore, StateManager};
use crate::{Index, NodeId};

impl<S: LogStore, M: StateManager, F: Fsm> Raft<S, M, F> {
    /// Drives replication for every peer: followers/learners behind the
    /// log's retained range get a snapshot, everyone else gets an append
    /// (or nothing, if their inflight window is already full).
    pub(crate) fn replicate_all(&mut self) {
        if !self.is_leader() {
            return;
        }
        let peers: Vec<NodeId> = self.tracker.iter().map(|(id, _)| *id).filter(|id| *id != self.id).collect();
        for id in peers {
            self.send_append_or_snapshot(id);
        }
        self.maybe_send_timeout_now();
    }

    fn send_append_or_snapshot(&mut self, id: NodeId) {
        let (next_index, can_send) = match self.tracker.get(id) {
            Some(p) => (p.next_index, p.can_send_more(self.config.max_inflight_msgs)),
            None => return,
        };
        if !can_send {
            return;
        }
        let prev_index = next_index - 1;
        match self.log.term(prev_index) {
            Some(prev_term) => self.send_append(id, prev_index, prev_term, next_index),
            None => self.send_snapshot(id),
        }
    }

    fn send_append(&mut self, id: NodeId, prev_index: Index, prev_term: u64, next_index: Index) {
        let last_index = self.log.last_index();
        let entries = if next_index > last_index {
            Vec::new()
        } else {
            match self.log.slice(next_index, last_index + 1) {
                Ok(e) => Self::cap_batch(e, self.config.max_size_per_msg),
                Err(e) => {
                    warn!(node = self.id, peer = id, error = %e, "log slice failed building append, falling back to snapshot");
                    self.send_snapshot(id);
                    return;
                }
            }
        };
        let commit = self.log.committed();
        self.send(
            id,
            MessageBody::Append(AppendEntriesRequest {
                prev_log_index: prev_index,
                prev_log_term: prev_term,
                leader_commit: commit,
                entries,
            }),
        );
        if let Some(p) = self.tracker.get_mut(id) {
            p.record_sent();
        }
    }

    /// Trims `entries` to the prefix whose payloads sum to at most
    /// `max_bytes`, per `Config::max_size_per_msg` (§4.5's `next..min(lastIndex,
    /// next+maxBatch)`). Always keeps at least one entry, even if it alone
    /// exceeds the cap, so a single oversized entry can never stall
    /// replication.
    fn cap_batch(entries: Vec<crate::entry::Entry>, max_bytes: u64) -> Vec<crate::entry::Entry> {
        if entries.len() <= 1 {
            return entries;
        }
        let mut total = 0u64;
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            let size = entry.payload.as_bytes().len() as u64;
            if !out.is_empty() && total + size > max_bytes {
                break;
            }
            total += size;
            out.push(entry);
        }
        out
    }

    fn send_snapshot(&mut self, id: NodeId) {
        let index = self.log.applied();
        let term = self.log.term(index).unwrap_or(0);
        let data = match self.fsm.get_snapshot(index) {
            Ok(d) => d,
            Err(e) => {
                warn!(node = self.id, peer = id, error = %e, "fsm refused to produce a snapshot");
                return;
            }
        };
        let conf = self.tracker.conf().clone();
        self.send(
            id,
            MessageBody::InstallSnapshot(InstallSnapshotRequest {
                last_included_index: index,
                last_included_term: term,
                conf,
                data,
            }),
        );
        if let Some(p) = self.tracker.get_mut(id) {
            p.become_snapshot(index);
        }
    }

    /// Broadcasts a content-free heartbeat to every peer. Unlike an append,
    /// a heartbeat never consumes the inflight window.
    pub(crate) fn broadcast_heartbeat(&mut self) {
        if !self.is_leader() {
            return;
        }
        let commit = self.log.committed();
        let peers: Vec<(NodeId, Index)> = self
            .tracker
            .iter()
            .filter(|(id, _)| **id != self.id)
            .map(|(id, p)| (*id, p.matched_index))
            .collect();
        for (id, matched) in peers {
            self.send(
                id,
                MessageBody::Heartbeat(HeartbeatRequest {
                    leader_commit: commit.min(matched),
                }),
            );
        }
    }

    /// Follower-side handler for [`AppendEntriesRequest`]: the normal
    /// replication path, plus log-conflict resolution via
    /// `find_conflict_by_term` 
    pub(crate) fn handle_append_entries(&mut self, from: NodeId, _term: u64, req: AppendEntriesRequest) {
        self.acknowledge_leader(from);

        if req.prev_log_index > 0 {
            let matches = self.log.term(req.prev_log_index) == Some(req.prev_log_term);
            if !matches {
                // Clamp the search to our own last index first: if the
                // leader's `prev_log_index` is beyond what we have at all
                // (a fresh or far-behind follower), searching backward from
                // an index we've never heard of finds nothing and degrades
                // to a one-at-a-time backoff. Starting from
                // `min(prev_log_index, last_index)` mirrors etcd-raft's
                // `hintIndex := min(m.Index, raftLog.lastIndex())` and
                // restores the bisection the design calls for.
                let hint_start = req.prev_log_index.min(self.log.last_index());
                let observed_term = self.log.term(hint_start).unwrap_or(0);
                let (conflict_index, conflict_term) = self.log.find_conflict_by_term(hint_start, observed_term);
                self.send(
                    from,
                    MessageBody::AppendResp(AppendEntriesResponse {
                        success: false,
                        conflict: Some(ConflictOpt {
                            index: conflict_index,
                            term: conflict_term,
                        }),
                        last_log_index: self.log.last_index(),
                    }),
                );
                return;
            }
        }

        // Leader Append-Only / onRollback: if any of the incoming entries
        // conflicts with what we already have, everything from that point on
        // was never safely committed and is about to be overwritten.
        if let Some(first_new) = req.entries.first() {
            if self.log.last_index() >= first_new.index {
                if let Some(existing_term) = self.log.term(first_new.index) {
                    if existing_term != first_new.term {
                        let _ = self.fsm.on_rollback(first_new.index);
                    }
                }
            }
        }

        if !req.entries.is_empty() {
            self.append_and_persist(req.entries);
        }

        if req.leader_commit > self.log.committed() {
            let new_commit = req.leader_commit.min(self.log.last_index());
            self.log.maybe_commit(new_commit);
        }
        self.advance_commit_and_apply();

        debug!(node = self.id, from, last_log_index = self.log.last_index(), "append accepted");
        self.send(
            from,
            MessageBody::AppendResp(AppendEntriesResponse {
                success: true,
                conflict: None,
                last_log_index: self.log.last_index(),
            }),
        );
    }

    /// Leader-side handler for [`AppendEntriesResponse`]. Only resends to
    /// `from` when this ack actually moved its progress (new match point or
    /// a corrected `next_index` after a conflict): an ack that changes
    /// nothing means `from` is already fully caught up, and resending an
    /// empty append in response to its own empty append's ack would loop
    /// forever.
    pub(crate) fn handle_append_response(&mut self, from: NodeId, resp: AppendEntriesResponse) {
        if !self.is_leader() {
            return;
        }
        let attempted_next = match self.tracker.get(from) {
            Some(p) => p.next_index,
            None => return,
        };
        if let Some(p) = self.tracker.get_mut(from) {
            p.record_ack();
        }
        let moved = if resp.success {
            let moved = self.tracker.get_mut(from).map(|p| p.maybe_update(resp.last_log_index)).unwrap_or(false);
            self.advance_commit_and_apply();
            moved
        } else {
            // `attempted_next` was this peer's `next_index` when the
            // rejected append was sent, so the `prev_log_index` it actually
            // carried is one less than that.
            let rejected_prev_index = attempted_next.saturating_sub(1);
            let hint = resp.conflict.map(|c| c.index).unwrap_or(0);
            self.tracker.get_mut(from).map(|p| p.maybe_decrease_to(rejected_prev_index, hint)).unwrap_or(false)
        };
        if moved {
            self.send_append_or_snapshot(from);
        }
        self.maybe_send_timeout_now();
    }

    /// Follower-side handler for a content-free [`HeartbeatRequest`].
    pub(crate) fn handle_heartbeat(&mut self, from: NodeId, req: HeartbeatRequest) {
        self.acknowledge_leader(from);
        if req.leader_commit > self.log.committed() {
            let new_commit = req.leader_commit.min(self.log.last_index());
            self.log.maybe_commit(new_commit);
            self.advance_commit_and_apply();
        }
        self.send(
            from,
            MessageBody::HeartbeatResp(HeartbeatResponse {
                last_log_index: self.log.last_index(),
            }),
        );
    }

    /// Leader-side handler for [`HeartbeatResponse`]: refreshes
    /// `recent_active` for checkQuorum and opportunistically advances
    /// `matched_index` if the follower reports being further ahead than we
    /// thought (e.g. after its own restart).
    pub(crate) fn handle_heartbeat_response(&mut self, from: NodeId, resp: HeartbeatResponse) {
        if !self.is_leader() {
            return;
        }
        if let Some(p) = self.tracker.get_mut(from) {
            p.recent_active = true;
            if resp.last_log_index > p.matched_index {
                p.maybe_update(resp.last_log_index);
                self.advance_commit_and_apply();
            }
        }
    }

    /// Follower-side handler for [`InstallSnapshotRequest`]: installs the
    /// application snapshot, then resets the log to start right after it
    /// 
    pub(crate) fn handle_install_snapshot(&mut self, from: NodeId, req: InstallSnapshotRequest) {
        self.acknowledge_leader(from);
        if req.last_included_index <= self.log.applied() {
            // Stale or duplicate snapshot; just echo our current position.
            self.send(
                from,
                MessageBody::InstallSnapshotResp(InstallSnapshotResponse {
                    last_log_index: self.log.last_index(),
                }),
            );
            return;
        }
        if let Err(e) = self.fsm.apply_snapshot(req.last_included_index, &req.data) {
            warn!(node = self.id, error = %e, "fsm rejected snapshot install");
            return;
        }
        if let Err(e) = self.log.restore_snapshot(req.last_included_index, req.last_included_term) {
            warn!(node = self.id, error = %e, "failed to prune the log store after snapshot install");
        }
        let next_index = self.log.last_index() + 1;
        self.tracker.set_conf(req.conf, next_index);
        let _ = self.persist_hard_state();
        let _ = self.persist_cluster_state(req.last_included_index);
        let _ = self.fsm.on_restore_done(req.last_included_index);
        self.send(
            from,
            MessageBody::InstallSnapshotResp(InstallSnapshotResponse {
                last_log_index: self.log.last_index(),
            }),
        );
    }

    /// Leader-side handler for [`InstallSnapshotResponse`]: moves the
    /// follower's progress out of `Snapshot` state, back to `Probe` starting
    /// right after the installed snapshot.
    pub(crate) fn handle_install_snapshot_response(&mut self, from: NodeId, resp: InstallSnapshotResponse) {
        if !self.is_leader() {
            return;
        }
        if let Some(p) = self.tracker.get_mut(from) {
            if p.pending_snapshot_index.map(|pending| resp.last_log_index >= pending).unwrap_or(true) {
                p.become_probe();
                p.next_index = resp.last_log_index + 1;
                p.maybe_update(resp.last_log_index);
            }
        }
        self.send_append_or_snapshot(from);
    }
}
