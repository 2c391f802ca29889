//! The replicated log: a facade over the durable [`crate::storage::LogStore`]
//! and the in-memory [`unstable::UnstableLog`] tail.
//!
//! Grounded in `examples/original_source/source/libs/sync/src/sync_raft_log.c`'s
//! role (not retrieved in the pack in full, but referenced throughout
//! `sync_raft_unstable_log.c` as `pRaft->log`) and in etcd-raft's `raftLog`,
//! whose split between an unstable tail and a storage-backed stable region
//! this crate's `storage.rs`/`log/unstable.rs` pair reproduces.

pub mod unstable;

use crate::entry::Entry;
use crate::error::RaftError;
use crate::storage::LogStore;
use crate::{Index, Term};

use self::unstable::UnstableLog;

/// Combines a durable [`LogStore`] with an [`UnstableLog`] tail to answer log
/// queries without the caller needing to know which half holds the answer.
pub struct RaftLog<S: LogStore> {
    store: S,
    unstable: UnstableLog,
    /// Highest index known to be committed by a quorum.
    committed: Index,
    /// Highest index actually applied to the state machine.
    applied: Index,
}

impl<S: LogStore> RaftLog<S> {
    pub fn new(store: S) -> Result<Self, RaftError> {
        let last_index = store.last_index().map_err(|e| RaftError::Store(e.to_string()))?;
        Ok(Self {
            store,
            unstable: UnstableLog::new(last_index),
            committed: 0,
            applied: 0,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn committed(&self) -> Index {
        self.committed
    }

    pub fn applied(&self) -> Index {
        self.applied
    }

    pub fn last_index(&self) -> Index {
        self.unstable.maybe_last_index().unwrap_or_else(|| self.store.last_index().unwrap_or(0))
    }

    pub fn first_index(&self) -> Index {
        self.unstable.maybe_first_index().unwrap_or_else(|| self.store.first_index().unwrap_or(1))
    }

    pub fn last_term(&self) -> Term {
        self.term(self.last_index()).unwrap_or(0)
    }

    pub fn term(&self, index: Index) -> Option<Term> {
        if index == 0 {
            return Some(0);
        }
        if let Some(t) = self.unstable.maybe_term(index) {
            return Some(t);
        }
        self.store.term(index).ok().flatten()
    }

    /// True if a candidate/leader whose own log ends at `(last_log_term,
    /// last_log_index)` is at least as up-to-date as this log: higher term
    /// wins, ties broken by longer log.
    pub fn is_up_to_date(&self, last_log_index: Index, last_log_term: Term) -> bool {
        let my_term = self.last_term();
        last_log_term > my_term || (last_log_term == my_term && last_log_index >= self.last_index())
    }

    /// Finds the (term, index) of the entry immediately preceding the first
    /// point of disagreement with a follower that rejected an append at
    /// `reject_index` claiming term `reject_term`, used to fast-forward
    /// `next_index` instead of backing off by one each round.
    pub fn find_conflict_by_term(&self, reject_index: Index, reject_term: Term) -> (Index, Term) {
        let mut index = reject_index;
        while index > 0 {
            match self.term(index) {
                Some(t) if t <= reject_term => return (index, t),
                Some(_) => index -= 1,
                None => break,
            }
        }
        (index, self.term(index).unwrap_or(0))
    }

    /// Appends entries proposed locally or received from a leader, replacing
    /// any conflicting unstable tail. Per spec §4.1's "replace" and
    /// "slice-then-append" cases, if the new entries conflict with a range
    /// already written through to the durable store, that stale durable
    /// tail is truncated away first — otherwise the store would keep
    /// serving the higher-index entries being overwritten here even after
    /// the unstable log (which shortly hands its own tail to the store and
    /// forgets it) no longer has any memory of them.
    pub fn append(&mut self, entries: Vec<Entry>) -> Result<(), RaftError> {
        if entries.is_empty() {
            return Ok(());
        }
        let after_index = entries[0].index;
        let store_last = self.store.last_index().map_err(|e| RaftError::Store(e.to_string()))?;
        if after_index <= store_last {
            self.store.truncate(after_index).map_err(|e| RaftError::Store(e.to_string()))?;
        }
        self.unstable.truncate_and_append(&entries);
        Ok(())
    }

    /// Returns the slice of entries in `[lo, hi)`, consulting the unstable
    /// tail first and falling back to the durable store for older entries.
    pub fn slice(&self, lo: Index, hi: Index) -> Result<Vec<Entry>, RaftError> {
        if lo >= hi {
            return Ok(Vec::new());
        }
        let unstable_first = self.unstable.maybe_first_index();
        let unstable_offset = self.unstable.offset();
        if lo >= unstable_offset {
            return Ok(self.unstable.slice(lo, hi));
        }
        let stable_hi = hi.min(unstable_offset);
        let mut out = self
            .store
            .entries(lo, stable_hi)
            .map_err(|e| RaftError::Store(e.to_string()))?;
        if hi > unstable_offset {
            out.extend(self.unstable.slice(unstable_offset, hi));
        }
        let _ = unstable_first;
        Ok(out)
    }

    /// Advances `committed` if `index` is higher, per the Commit Monotonicity invariant.
    pub fn maybe_commit(&mut self, index: Index) -> bool {
        if index > self.committed {
            self.committed = index;
            true
        } else {
            false
        }
    }

    pub fn set_applied(&mut self, index: Index) {
        self.applied = index;
    }

    /// Persists everything in the unstable tail up to `(index, term)` via the
    /// durable store, then drops it from the in-memory tail. The store write
    /// happens before the unstable log forgets the entries, so a crash
    /// between the two leaves the store, not memory, as the source of truth.
    /// `store.commit()` is called right after the write as the durability
    /// barrier spec §3/§6 require (`logCommit`) — only once that returns is
    /// the unstable tail allowed to forget the entries it just handed off.
    pub fn persist_to(&mut self, index: Index, term: Term) -> Result<(), RaftError> {
        if index < self.unstable.offset() {
            return Ok(());
        }
        let entries = self.unstable.slice(self.unstable.offset(), index + 1);
        if !entries.is_empty() {
            self.store.append(&entries).map_err(|e| RaftError::Store(e.to_string()))?;
            self.store.commit().map_err(|e| RaftError::Store(e.to_string()))?;
        }
        self.unstable.stable_to(index, term);
        Ok(())
    }

    /// Installs a follower-side snapshot: resets the unstable log to start
    /// right after `index`, then prunes the durable store of every entry
    /// the snapshot now makes redundant (spec's `logPrune`), so a follower
    /// that just jumped forward via `InstallSnapshot` doesn't keep serving
    /// stale pre-snapshot entries out of the store.
    pub fn restore_snapshot(&mut self, index: Index, term: Term) -> Result<(), RaftError> {
        self.unstable.restore_snapshot(index, term);
        self.committed = self.committed.max(index);
        self.applied = self.applied.max(index);
        self.store.prune(index + 1).map_err(|e| RaftError::Store(e.to_string()))?;
        Ok(())
    }
}
