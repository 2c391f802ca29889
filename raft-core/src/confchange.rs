//! Joint-consensus configuration changer.
//!
//! Generalizes the single-in-flight-change discipline of
//! `examples/simon-fu-async-raft/async-raft/src/core/admin.rs`
//! (`change_membership`/`append_membership_log`, which reject a new change
//! while `self.core.membership.members_after_consensus` is still pending)
//! to full joint consensus as the design requires.

use crate::membership::{ConfChangeSingle, Configuration};
use crate::Index;

/// Applies a batch of [`ConfChangeSingle`] ops to `conf`, entering a joint
/// configuration (remembering the prior voters in `outgoing`) whenever the
/// batch would otherwise change voter majorities in one atomic step.
///
/// Mirrors etcd-raft's `confchange.Changer::EnterJoint`: if a single op only
/// touches learners, or only adds a voter when there's currently exactly one
/// voter (not really ambiguous), no joint phase is needed; everything else
/// goes through the joint path for safety.
pub fn enter_joint(conf: &Configuration, ops: &[ConfChangeSingle], auto_leave: bool) -> Configuration {
    let mut next = conf.clone();
    if !next.is_joint() {
        next.outgoing = next.incoming.clone();
    }
    for op in ops {
        next.apply_single(op);
    }
    next.auto_leave = auto_leave;
    next
}

/// Leaves a joint configuration: `incoming` becomes the sole voter set.
pub fn leave_joint(conf: &Configuration) -> Configuration {
    let mut next = conf.clone();
    next.leave_joint();
    next
}

/// Applies a configuration change entry's effect directly (non-joint path),
/// used when the caller has determined a joint phase is unnecessary.
pub fn simple(conf: &Configuration, ops: &[ConfChangeSingle]) -> Configuration {
    let mut next = conf.clone();
    for op in ops {
        next.apply_single(op);
    }
    next
}

/// Tracks the single in-flight configuration change invariant :
/// at most one non-leave-joint conf-change entry may be uncommitted at a
/// time. Mirrors `pendingConfIndex` from etcd-raft and the teacher's
/// `members_after_consensus` guard.
#[derive(Clone, Copy, Debug, Default)]
pub struct PendingConfTracker {
    pending_index: Option<Index>,
}

impl PendingConfTracker {
    pub fn is_pending(&self) -> bool {
        self.pending_index.is_some()
    }

    pub fn pending_index(&self) -> Option<Index> {
        self.pending_index
    }

    /// Records that a conf-change entry was just appended at `index`.
    /// Panics if another change is already pending — callers must check
    /// `is_pending` first; this mirrors the single-in-flight invariant
    /// being enforced before the entry is ever proposed.
    pub fn mark_pending(&mut self, index: Index) {
        debug_assert!(self.pending_index.is_none(), "only one conf change may be in flight");
        self.pending_index = Some(index);
    }

    /// Clears the pending marker once the entry at `index` has committed
    /// (or been truncated away by a new leader).
    pub fn clear_if_at_or_before(&mut self, index: Index) {
        if let Some(p) = self.pending_index {
            if p <= index {
                self.pending_index = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreeset;

    #[test]
    fn enter_joint_remembers_outgoing() {
        let conf = Configuration::simple(btreeset! {1, 2, 3});
        let next = enter_joint(&conf, &[ConfChangeSingle::AddVoter(4), ConfChangeSingle::RemoveVoter(1)], true);
        assert!(next.is_joint());
        assert_eq!(next.outgoing, btreeset! {1, 2, 3});
        assert_eq!(next.incoming, btreeset! {2, 3, 4});
        assert!(next.auto_leave);
    }

    #[test]
    fn leave_joint_finalizes_incoming() {
        let conf = Configuration {
            incoming: btreeset! {2, 3, 4},
            outgoing: btreeset! {1, 2, 3},
            learners: Default::default(),
            auto_leave: true,
        };
        let next = leave_joint(&conf);
        assert!(!next.is_joint());
        assert_eq!(next.incoming, btreeset! {2, 3, 4});
        assert!(next.learners.contains(&1));
    }

    #[test]
    fn pending_conf_tracker_enforces_single_in_flight() {
        let mut t = PendingConfTracker::default();
        assert!(!t.is_pending());
        t.mark_pending(5);
        assert!(t.is_pending());
        t.clear_if_at_or_before(4);
        assert!(t.is_pending());
        t.clear_if_at_or_before(5);
        assert!(!t.is_pending());
    }
}
