//! Cluster membership and joint-consensus configuration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::NodeId;

/// A single atomic membership change, applied one at a time while a joint
/// configuration is in effect. Mirrors `ConfChangeSingle` from the design.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ConfChangeSingle {
    AddVoter(NodeId),
    RemoveVoter(NodeId),
    AddLearner(NodeId),
    RemoveLearner(NodeId),
}

/// The full membership of a replica group. While `outgoing` is non-empty the
/// configuration is in "joint" state: both `incoming` and `outgoing` must
/// separately reach quorum for an entry to commit, or for a candidate to win
/// an election (see [`crate::progress::tracker::ProgressTracker::quorum`]).
///
/// Generalizes the teacher's single-set `MembershipConfig` (see
/// `examples/simon-fu-async-raft/async-raft/src/raft.rs`) to joint consensus,
/// which the design requires but the teacher's non-joint design did not need.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Voters in the new (or, outside of a joint change, the only) configuration.
    pub incoming: BTreeSet<NodeId>,
    /// Voters in the old configuration, kept alive only while a joint change
    /// has not yet been left. Empty when not in a joint configuration.
    pub outgoing: BTreeSet<NodeId>,
    /// Non-voting members that receive log replication but never count
    /// towards quorum.
    pub learners: BTreeSet<NodeId>,
    /// If true, the leader automatically proposes a "leave joint" entry as
    /// soon as the joint configuration commits.
    pub auto_leave: bool,
}

impl Configuration {
    pub fn simple(voters: BTreeSet<NodeId>) -> Self {
        Self {
            incoming: voters,
            outgoing: BTreeSet::new(),
            learners: BTreeSet::new(),
            auto_leave: false,
        }
    }

    pub fn is_joint(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// All node ids that are voters in either half of a joint configuration.
    pub fn all_voters(&self) -> BTreeSet<NodeId> {
        self.incoming.union(&self.outgoing).copied().collect()
    }

    pub fn contains_voter(&self, id: NodeId) -> bool {
        self.incoming.contains(&id) || self.outgoing.contains(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.contains_voter(id) || self.learners.contains(&id)
    }

    /// Applies a single conf-change op to `incoming` (the new config half);
    /// `outgoing` is only ever populated by [`crate::confchange::enter_joint`].
    pub fn apply_single(&mut self, op: &ConfChangeSingle) {
        match op {
            ConfChangeSingle::AddVoter(id) => {
                self.learners.remove(id);
                self.incoming.insert(*id);
            }
            ConfChangeSingle::RemoveVoter(id) => {
                self.incoming.remove(id);
            }
            ConfChangeSingle::AddLearner(id) => {
                self.incoming.remove(id);
                self.learners.insert(*id);
            }
            ConfChangeSingle::RemoveLearner(id) => {
                self.learners.remove(id);
            }
        }
    }

    /// Leaves the joint state: `incoming` becomes the sole configuration and
    /// any voter dropped from `incoming` during the joint change becomes a
    /// learner (per etcd-raft's `leaveJoint` semantics), preserving
    /// replication continuity for nodes removed as voters but not yet
    /// fully decommissioned.
    pub fn leave_joint(&mut self) {
        for id in self.outgoing.difference(&self.incoming).copied().collect::<Vec<_>>() {
            self.learners.insert(id);
        }
        self.outgoing.clear();
        self.auto_leave = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreeset;

    #[test]
    fn simple_config_is_not_joint() {
        let conf = Configuration::simple(btreeset! {1, 2, 3});
        assert!(!conf.is_joint());
        assert_eq!(conf.all_voters(), btreeset! {1, 2, 3});
    }

    #[test]
    fn leave_joint_demotes_removed_voters_to_learners() {
        let mut conf = Configuration {
            incoming: btreeset! {1, 2, 4},
            outgoing: btreeset! {1, 2, 3},
            learners: BTreeSet::new(),
            auto_leave: true,
        };
        conf.leave_joint();
        assert!(!conf.is_joint());
        assert_eq!(conf.incoming, btreeset! {1, 2, 4});
        assert_eq!(conf.learners, btreeset! {3});
        assert!(!conf.auto_leave);
    }
}
