//! Per-peer replication progress.

pub mod tracker;

use crate::Index;

/// Which strategy a leader is currently using to bring a follower's log in
/// sync. Named after etcd-raft's state machine, reached via this crate's
/// `examples/simon-fu-async-raft/async-raft/src/replication/mod.rs`
/// `TargetReplState`, synchronized onto a single leader-held record instead
/// of each follower having its own background replication task.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressState {
    /// Sending at most one entry at a time and waiting for an ack before
    /// advancing, used right after an election or a rejected append while
    /// the true match point is still being discovered.
    Probe,
    /// Steady state: pipelining as many entries as `max_inflight_msgs` allows.
    Replicate,
    /// The follower has fallen too far behind the leader's retained log;
    /// a snapshot is in flight.
    Snapshot,
}

/// Leader-side bookkeeping for a single follower (or learner).
#[derive(Clone, Copy, Debug)]
pub struct Progress {
    /// Index of the next entry to send this peer.
    pub next_index: Index,
    /// Highest index this peer is known to have durably replicated.
    pub matched_index: Index,
    pub state: ProgressState,
    /// Number of append messages sent but not yet acknowledged, capped by
    /// `Config::max_inflight_msgs` while in `Replicate` state.
    pub inflight: usize,
    /// Whether this peer has acknowledged any message in the current term,
    /// consulted by checkQuorum.
    pub recent_active: bool,
    /// Set while a snapshot is in flight to this peer, so a second
    /// `get_snapshot` demand for the same index can be coalesced into the
    /// one already outstanding instead of asking the FSM twice.
    pub pending_snapshot_index: Option<Index>,
}

impl Progress {
    pub fn new(next_index: Index) -> Self {
        Self {
            next_index,
            matched_index: 0,
            state: ProgressState::Probe,
            inflight: 0,
            recent_active: false,
            pending_snapshot_index: None,
        }
    }

    pub fn become_probe(&mut self) {
        self.state = ProgressState::Probe;
        self.inflight = 0;
    }

    pub fn become_replicate(&mut self) {
        self.state = ProgressState::Replicate;
        self.inflight = 0;
        self.pending_snapshot_index = None;
    }

    pub fn become_snapshot(&mut self, pending_index: Index) {
        self.state = ProgressState::Snapshot;
        self.inflight = 0;
        self.pending_snapshot_index = Some(pending_index);
    }

    /// Records that an outstanding append was acknowledged (granted or
    /// rejected), freeing one slot in the inflight window.
    pub fn record_ack(&mut self) {
        self.inflight = self.inflight.saturating_sub(1);
    }

    /// Records a successful append ack up to `index`, advancing
    /// `matched_index`/`next_index` and, if still probing, promoting to
    /// steady-state replication.
    pub fn maybe_update(&mut self, index: Index) -> bool {
        if self.matched_index >= index {
            return false;
        }
        self.matched_index = index;
        self.next_index = index + 1;
        self.recent_active = true;
        if self.state != ProgressState::Replicate {
            self.become_replicate();
        }
        true
    }

    /// Handles a rejected append whose `prev_log_index` was `rejected`,
    /// backing `next_index` off per spec §4.3's
    /// `next = max(match+1, min(rejected, hint+1))` — bisecting straight to
    /// the follower-reported conflict point instead of retreating one index
    /// per round trip. `rejected` not matching the outstanding probe
    /// (`next_index - 1`) means this is a stale or duplicate rejection and
    /// is ignored, mirroring etcd-raft's `MaybeDecrTo`.
    pub fn maybe_decrease_to(&mut self, rejected: Index, hint: Index) -> bool {
        if self.state == ProgressState::Replicate {
            if rejected <= self.matched_index {
                return false;
            }
            self.become_probe();
            self.next_index = self.matched_index + 1;
            return true;
        }
        if self.next_index == 0 || self.next_index - 1 != rejected {
            return false;
        }
        self.next_index = rejected.min(hint + 1).max(self.matched_index + 1).max(1);
        true
    }

    pub fn can_send_more(&self, max_inflight: usize) -> bool {
        match self.state {
            ProgressState::Replicate => self.inflight < max_inflight,
            ProgressState::Probe => self.inflight == 0,
            ProgressState::Snapshot => false,
        }
    }

    pub fn record_sent(&mut self) {
        self.inflight += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maybe_decrease_to_bisects_straight_to_the_hint() {
        let mut p = Progress::new(11);
        assert!(p.can_send_more(1));
        p.record_sent();
        // Follower rejected prev_log_index 10, reporting it has nothing
        // past index 0 at all (a brand new follower).
        assert!(p.maybe_decrease_to(10, 0));
        assert_eq!(p.next_index, 1, "should jump straight to 1, not retreat one index at a time");
    }

    #[test]
    fn maybe_decrease_to_ignores_a_stale_rejection() {
        let mut p = Progress::new(11);
        // A rejection for a prev_log_index that doesn't match what's
        // currently outstanding (next_index - 1) is stale; ignore it.
        assert!(!p.maybe_decrease_to(3, 0));
        assert_eq!(p.next_index, 11);
    }

    #[test]
    fn maybe_decrease_to_from_replicate_falls_back_to_probe_at_match_plus_one() {
        let mut p = Progress::new(1);
        p.maybe_update(5);
        assert_eq!(p.state, ProgressState::Replicate);
        p.next_index = 9;
        assert!(p.maybe_decrease_to(8, 6));
        assert_eq!(p.state, ProgressState::Probe);
        assert_eq!(p.next_index, 6, "replicate-state rejection resets to match+1, not the hint");
    }
}
