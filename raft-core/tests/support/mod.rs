//! A synchronous in-process router for driving several [`RaftDriver`]s
//! against one another, in the spirit of the teacher's `RaftRouter`
//! (`examples/simon-fu-async-raft/async-raft/tests/fixtures/mod.rs`). The
//! teacher's router ferries messages between tokio tasks over channels with
//! simulated network delay; this crate's core has no tasks and no channels
//! of its own; the router here is correspondingly simpler: an inbox queue
//! that the test drains by hand between ticks.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use raft_core::entry::EntryPayload;
use raft_core::error::ProposeError;
use raft_core::membership::{ConfChangeSingle, Configuration};
use raft_core::message::Message;
use raft_core::storage::{ClusterState, StateManager};
use raft_core::{Config, Index, NodeId, RaftDriver, Term};
use raft_memstore::{MemFsm, MemLogStore, MemStateManager};

pub type TestDriver = RaftDriver<MemLogStore, MemStateManager, MemFsm>;

/// A fixed-membership cluster of in-process Raft replicas wired together by
/// a manually-drained message queue. Nodes added to `isolated` behave as if
/// partitioned: messages to or from them are dropped rather than delivered.
pub struct Cluster {
    pub nodes: BTreeMap<NodeId, TestDriver>,
    inbox: VecDeque<Message>,
    isolated: BTreeSet<NodeId>,
}

impl Cluster {
    /// Brings up a fresh cluster with `ids` as the sole voters, all starting
    /// from an empty log at term 0.
    pub fn new(ids: &[NodeId], config: Config) -> Self {
        let voters: BTreeSet<NodeId> = ids.iter().copied().collect();
        let mut nodes = BTreeMap::new();
        for &id in ids {
            let mut state_mgr = MemStateManager::new();
            state_mgr
                .save_cluster_state(&ClusterState {
                    conf: Configuration::simple(voters.clone()),
                    conf_index: 0,
                })
                .expect("seed cluster state");
            let driver = RaftDriver::start(1, id, config.clone(), MemLogStore::new(), state_mgr, MemFsm::new()).expect("start node");
            nodes.insert(id, driver);
        }
        Self {
            nodes,
            inbox: VecDeque::new(),
            isolated: BTreeSet::new(),
        }
    }

    fn enqueue(&mut self, msgs: Vec<Message>) {
        for msg in msgs {
            if self.isolated.contains(&msg.from) || self.isolated.contains(&msg.to) {
                continue;
            }
            self.inbox.push_back(msg);
        }
    }

    /// Advances one node's timer by one tick.
    pub fn tick(&mut self, id: NodeId) {
        let out = self.nodes.get_mut(&id).expect("node exists").tick();
        self.enqueue(out);
    }

    /// Advances every node's timer by one tick, in id order.
    pub fn tick_all(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            self.tick(id);
        }
    }

    /// Delivers every queued message, re-queuing whatever replies they
    /// provoke, until the inbox is empty. Bounded so a bug that causes an
    /// infinite message ping-pong fails the test instead of hanging it.
    pub fn drain(&mut self) {
        let mut delivered = 0usize;
        while let Some(msg) = self.inbox.pop_front() {
            delivered += 1;
            assert!(delivered < 100_000, "message storm: possible infinite step/reply loop");
            if let Some(driver) = self.nodes.get_mut(&msg.to) {
                let out = driver.step(msg);
                self.enqueue(out);
            }
        }
    }

    /// Ticks `id` once and fully drains the resulting traffic.
    pub fn tick_and_drain(&mut self, id: NodeId) {
        self.tick(id);
        self.drain();
    }

    /// Ticks every node once and fully drains the resulting traffic.
    pub fn tick_all_and_drain(&mut self) {
        self.tick_all();
        self.drain();
    }

    /// Partitions `id` away from the rest of the cluster.
    pub fn isolate(&mut self, id: NodeId) {
        self.isolated.insert(id);
    }

    /// Heals a previously isolated node's partition.
    pub fn heal(&mut self, id: NodeId) {
        self.isolated.remove(&id);
    }

    /// The id of the node currently believing itself leader, if exactly one
    /// does (callers asserting Election Safety check this count themselves).
    pub fn leaders(&self) -> Vec<NodeId> {
        self.nodes.iter().filter(|(_, d)| d.is_leader()).map(|(id, _)| *id).collect()
    }

    /// Repeatedly ticks `id` until it reports itself leader or `max_ticks`
    /// elapses, draining all traffic between ticks.
    pub fn elect(&mut self, id: NodeId, max_ticks: u64) -> bool {
        for _ in 0..max_ticks {
            if self.nodes[&id].is_leader() {
                return true;
            }
            self.tick_and_drain(id);
        }
        self.nodes[&id].is_leader()
    }

    pub fn current_term(&self, id: NodeId) -> Term {
        self.nodes[&id].metrics().current_term
    }

    /// Proposes a client entry on `id` and delivers whatever traffic that
    /// produces. Mirrors `driver.propose` plus the router's delivery duty —
    /// a real host would do both right away too, not wait for the next tick.
    pub fn propose(&mut self, id: NodeId, payload: impl Into<EntryPayload>) -> Result<Index, ProposeError> {
        let (result, out) = self.nodes.get_mut(&id).expect("node exists").propose(payload, false);
        self.enqueue(out);
        result
    }

    /// Proposes a joint-consensus membership change on `id` and delivers
    /// whatever traffic that produces.
    pub fn reconfig(&mut self, id: NodeId, ops: Vec<ConfChangeSingle>) -> Result<Index, raft_core::ConfChangeError> {
        let (result, out) = self.nodes.get_mut(&id).expect("node exists").reconfig(ops);
        self.enqueue(out);
        result
    }

    /// Adds a brand new, non-voting node to the cluster (e.g. a future
    /// joint-consensus voter that hasn't been added to the configuration
    /// yet). It will not campaign until it is named a voter in a committed
    /// configuration.
    pub fn add_node(&mut self, id: NodeId, config: Config) {
        let driver = RaftDriver::start(1, id, config, MemLogStore::new(), MemStateManager::new(), MemFsm::new()).expect("start node");
        self.nodes.insert(id, driver);
    }

    /// Begins a leadership transfer from `id` to `target` and delivers
    /// whatever traffic that produces.
    pub fn transfer_leadership(&mut self, id: NodeId, target: NodeId) -> Result<(), raft_core::RaftError> {
        let (result, out) = self.nodes.get_mut(&id).expect("node exists").transfer_leadership(target);
        self.enqueue(out);
        result
    }
}
