//! Tracks every peer's [`Progress`] and computes quorum over a
//! (possibly joint) configuration.

use std::collections::BTreeMap;

use crate::membership::Configuration;
use crate::progress::Progress;
use crate::{Index, NodeId};

/// Leader-side state for every voter and learner in the current (possibly
/// joint) configuration.
#[derive(Clone, Debug, Default)]
pub struct ProgressTracker {
    progress: BTreeMap<NodeId, Progress>,
    conf: Configuration,
}

impl ProgressTracker {
    pub fn new(conf: Configuration, next_index: Index) -> Self {
        let mut progress = BTreeMap::new();
        for id in conf.incoming.iter().chain(conf.outgoing.iter()).chain(conf.learners.iter()) {
            progress.entry(*id).or_insert_with(|| Progress::new(next_index));
        }
        Self { progress, conf }
    }

    pub fn conf(&self) -> &Configuration {
        &self.conf
    }

    /// Replaces the tracked configuration, preserving existing [`Progress`]
    /// records for nodes that remain and seeding fresh ones (at
    /// `next_index`) for nodes newly added.
    pub fn set_conf(&mut self, conf: Configuration, next_index: Index) {
        for id in conf.incoming.iter().chain(conf.outgoing.iter()).chain(conf.learners.iter()) {
            self.progress.entry(*id).or_insert_with(|| Progress::new(next_index));
        }
        self.progress.retain(|id, _| conf.contains(*id));
        self.conf = conf;
    }

    pub fn get(&self, id: NodeId) -> Option<&Progress> {
        self.progress.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Progress> {
        self.progress.get_mut(&id)
    }

    pub fn voter_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.progress.keys().copied().filter(move |id| self.conf.contains_voter(*id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Progress)> {
        self.progress.iter()
    }

    /// The largest index acknowledged by a quorum of each voter half,
    /// taking the minimum across halves while the configuration is joint
    /// (Joint Consensus Safety).
    pub fn committed_index(&self) -> Index {
        let incoming = Self::quorum_match(&self.progress, &self.conf.incoming);
        if self.conf.is_joint() {
            let outgoing = Self::quorum_match(&self.progress, &self.conf.outgoing);
            incoming.min(outgoing)
        } else {
            incoming
        }
    }

    fn quorum_match(progress: &BTreeMap<NodeId, Progress>, voters: &std::collections::BTreeSet<NodeId>) -> Index {
        if voters.is_empty() {
            return Index::MAX;
        }
        let mut matched: Vec<Index> = voters
            .iter()
            .map(|id| progress.get(id).map(|p| p.matched_index).unwrap_or(0))
            .collect();
        matched.sort_unstable();
        matched[(matched.len() - 1) / 2]
    }

    /// True if `votes` (the set of nodes that granted a vote) forms a
    /// quorum in every voter half of the current configuration.
    pub fn vote_quorum(&self, votes: &std::collections::BTreeSet<NodeId>) -> bool {
        let incoming_ok = Self::is_quorum(&self.conf.incoming, votes);
        if self.conf.is_joint() {
            incoming_ok && Self::is_quorum(&self.conf.outgoing, votes)
        } else {
            incoming_ok
        }
    }

    /// True if `votes` contains strictly more than half of `voters`. An
    /// empty voter set trivially has quorum (used for the outgoing half of
    /// a configuration that was never joint).
    pub fn is_quorum(voters: &std::collections::BTreeSet<NodeId>, votes: &std::collections::BTreeSet<NodeId>) -> bool {
        if voters.is_empty() {
            return true;
        }
        let have = voters.intersection(votes).count();
        have * 2 > voters.len()
    }

    pub fn active_quorum(&self) -> bool {
        let active: std::collections::BTreeSet<NodeId> = self
            .progress
            .iter()
            .filter(|(_, p)| p.recent_active)
            .map(|(id, _)| *id)
            .collect();
        self.vote_quorum(&active)
    }

    pub fn reset_recent_active(&mut self) {
        for p in self.progress.values_mut() {
            p.recent_active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreeset;

    #[test]
    fn simple_majority_quorum() {
        let conf = Configuration::simple(btreeset! {1, 2, 3});
        let mut t = ProgressTracker::new(conf, 1);
        t.get_mut(1).unwrap().maybe_update(5);
        t.get_mut(2).unwrap().maybe_update(5);
        assert_eq!(t.committed_index(), 5);
    }

    #[test]
    fn joint_quorum_requires_both_halves() {
        let conf = Configuration {
            incoming: btreeset! {1, 2, 3},
            outgoing: btreeset! {1, 4, 5},
            learners: Default::default(),
            auto_leave: true,
        };
        let mut t = ProgressTracker::new(conf, 1);
        t.get_mut(1).unwrap().maybe_update(10);
        t.get_mut(2).unwrap().maybe_update(10);
        t.get_mut(3).unwrap().maybe_update(10);
        // outgoing half (1,4,5) only has node 1 at 10; 4 and 5 are still at 0.
        assert_eq!(t.committed_index(), 0);
        t.get_mut(4).unwrap().maybe_update(10);
        assert_eq!(t.committed_index(), 10);
    }
}
