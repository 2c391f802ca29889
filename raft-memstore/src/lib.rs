//! An in-memory implementation of `raft-core`'s [`LogStore`], [`StateManager`]
//! and [`Fsm`] traits, for tests and local experimentation.
//!
//! No `memstore` source was retrieved alongside the teacher
//! (`examples/simon-fu-async-raft/memstore` carries only a `Cargo.toml`), so
//! this crate is authored fresh against that crate's stated role — "an
//! in-memory implementation of the storage trait" — using the same
//! dependency stack (`anyhow`, `serde`/`serde_json`, `thiserror`, `tracing`).
//! Where the teacher's `memstore` guards its maps with a `tokio::sync::RwLock`
//! because multiple async tasks touch the same store concurrently, this
//! crate's core only ever calls storage from one synchronous call stack, so
//! a plain `BTreeMap` behind `&mut self` is enough.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use bytes::Bytes;
use raft_core::{Entry, Fsm};
use raft_core::membership::Configuration;
use raft_core::storage::{ClusterState, LogStore, ServerState, StateManager};
use raft_core::{Index, NodeId, Term};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
enum MemStoreError {
    #[error("index {0} has already been compacted out of this store")]
    Compacted(Index),
}

/// An in-memory, append-only log keyed by index. Entries below `first_index`
/// have been pruned and are no longer retrievable.
#[derive(Default)]
pub struct MemLogStore {
    entries: BTreeMap<Index, Entry>,
}

impl MemLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogStore for MemLogStore {
    fn append(&mut self, entries: &[Entry]) -> Result<()> {
        for entry in entries {
            self.entries.insert(entry.index, entry.clone());
        }
        Ok(())
    }

    fn entries(&self, lo: Index, hi: Index) -> Result<Vec<Entry>> {
        Ok(self.entries.range(lo..hi).map(|(_, e)| e.clone()).collect())
    }

    fn term(&self, index: Index) -> Result<Option<Term>> {
        Ok(self.entries.get(&index).map(|e| e.term))
    }

    fn last_index(&self) -> Result<Index> {
        Ok(self.entries.keys().next_back().copied().unwrap_or(0))
    }

    fn first_index(&self) -> Result<Index> {
        Ok(self.entries.keys().next().copied().unwrap_or(1))
    }

    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    fn prune(&mut self, index: Index) -> Result<()> {
        self.entries = self.entries.split_off(&index);
        Ok(())
    }

    fn truncate(&mut self, index: Index) -> Result<()> {
        self.entries.split_off(&index);
        Ok(())
    }
}

/// Persists [`ServerState`] and [`ClusterState`] as plain fields, serialized
/// through nothing more than an in-process clone.
#[derive(Default)]
pub struct MemStateManager {
    server_state: Option<ServerState>,
    cluster_state: Option<ClusterState>,
}

impl MemStateManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateManager for MemStateManager {
    fn save_server_state(&mut self, state: &ServerState) -> Result<()> {
        self.server_state = Some(*state);
        Ok(())
    }

    fn read_server_state(&self) -> Result<Option<ServerState>> {
        Ok(self.server_state)
    }

    fn save_cluster_state(&mut self, state: &ClusterState) -> Result<()> {
        self.cluster_state = Some(state.clone());
        Ok(())
    }

    fn read_cluster_state(&self) -> Result<Option<ClusterState>> {
        Ok(self.cluster_state.clone())
    }
}

/// A snapshot of [`MemFsm`], serialized via `serde_json` the way the
/// teacher's `memstore` snapshots its `MemStoreStateMachine`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct MemFsmSnapshot {
    last_applied: Index,
    data: BTreeMap<Index, Vec<u8>>,
}

/// A trivial state machine that records every applied payload keyed by the
/// index it committed at, closely modeled on the teacher's
/// `MemStoreStateMachine` (a `BTreeMap` of applied client requests) but
/// storing raw bytes instead of a typed `ClientRequest`, since this crate's
/// entries carry opaque payloads.
#[derive(Default)]
pub struct MemFsm {
    last_applied: Index,
    data: BTreeMap<Index, Bytes>,
    conf: Configuration,
}

impl MemFsm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: Index) -> Option<&Bytes> {
        self.data.get(&index)
    }

    pub fn last_applied(&self) -> Index {
        self.last_applied
    }

    pub fn conf(&self) -> &Configuration {
        &self.conf
    }
}

impl Fsm for MemFsm {
    fn apply_log(&mut self, index: Index, payload: &Bytes) -> Result<()> {
        debug!(index, len = payload.len(), "applying entry");
        self.data.insert(index, payload.clone());
        self.last_applied = index;
        Ok(())
    }

    fn on_cluster_changed(&mut self, _index: Index, conf: &Configuration) -> Result<()> {
        self.conf = conf.clone();
        Ok(())
    }

    fn get_snapshot(&self, index: Index) -> Result<Bytes> {
        if index < self.last_applied {
            return Err(anyhow!(MemStoreError::Compacted(index)));
        }
        let snapshot = MemFsmSnapshot {
            last_applied: self.last_applied,
            data: self.data.iter().map(|(i, b)| (*i, b.to_vec())).collect(),
        };
        let bytes = serde_json::to_vec(&snapshot)?;
        Ok(Bytes::from(bytes))
    }

    fn apply_snapshot(&mut self, index: Index, data: &Bytes) -> Result<()> {
        let snapshot: MemFsmSnapshot = serde_json::from_slice(data)?;
        self.data = snapshot.data.into_iter().map(|(i, v)| (i, Bytes::from(v))).collect();
        self.last_applied = snapshot.last_applied.max(index);
        Ok(())
    }

    fn on_restore_done(&mut self, _index: Index) -> Result<()> {
        Ok(())
    }

    fn on_rollback(&mut self, from_index: Index) -> Result<()> {
        self.data.retain(|i, _| *i < from_index);
        self.last_applied = self.last_applied.min(from_index.saturating_sub(1));
        Ok(())
    }

    fn on_role_changed(&mut self, _role: raft_core::fsm::Role, _leader: Option<NodeId>) -> Result<()> {
        Ok(())
    }
}
