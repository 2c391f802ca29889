//! The in-memory tail of the log that has not yet been made durable.
//!
//! Ported from `examples/original_source/source/libs/sync/src/sync_raft_unstable_log.c`'s
//! `SSyncRaftUnstableLog`. `entries[i]` holds log position `i + offset`; a
//! snapshot, if present, covers everything up to and including
//! `snapshot_index`. One deliberate deviation from the original: `stable_to`
//! there advances `offset` with `offset += 1`, which is wrong whenever more
//! than one entry is being marked stable in a single call (it should track
//! how far past the matched entry the store actually advanced). This port
//! uses `offset = i + 1`, per spec's corrected algorithm.

use crate::entry::Entry;
use crate::{Index, Term};

#[derive(Clone, Debug, Default)]
pub struct UnstableLog {
    snapshot_index: Option<Index>,
    snapshot_term: Option<Term>,
    entries: Vec<Entry>,
    /// Log index of `entries[0]`, i.e. the first position not yet durable.
    offset: Index,
}

impl UnstableLog {
    /// Creates an empty unstable log positioned right after `last_index`
    /// (the last index already durable in the log store at startup).
    pub fn new(last_index: Index) -> Self {
        Self {
            snapshot_index: None,
            snapshot_term: None,
            entries: Vec::new(),
            offset: last_index + 1,
        }
    }

    pub fn offset(&self) -> Index {
        self.offset
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot_index.is_some()
    }

    pub fn restore_snapshot(&mut self, index: Index, term: Term) {
        self.entries.clear();
        self.offset = index + 1;
        self.snapshot_index = Some(index);
        self.snapshot_term = Some(term);
    }

    /// The first index this unstable log could possibly serve, if it has a snapshot.
    pub fn maybe_first_index(&self) -> Option<Index> {
        self.snapshot_index.map(|i| i + 1)
    }

    /// The last index covered by this unstable log: the last unstable
    /// entry's index if any exist, else the snapshot's index, else `None`.
    pub fn maybe_last_index(&self) -> Option<Index> {
        if let Some(last) = self.entries.last() {
            Some(last.index)
        } else {
            self.snapshot_index
        }
    }

    /// The term of the entry at `index`, if this unstable log can answer.
    pub fn maybe_term(&self, index: Index) -> Option<Term> {
        if index < self.offset {
            return match (self.snapshot_index, self.snapshot_term) {
                (Some(si), Some(st)) if si == index => Some(st),
                _ => None,
            };
        }
        let last = self.maybe_last_index()?;
        if index > last {
            return None;
        }
        self.entries.get((index - self.offset) as usize).map(|e| e.term)
    }

    /// Marks every entry up to and including `(index, term)` as durable,
    /// dropping it from the in-memory tail. A no-op if `term` does not match
    /// what this unstable log believes is at `index` (stale acknowledgment).
    pub fn stable_to(&mut self, index: Index, term: Term) {
        let gt = match self.maybe_term(index) {
            Some(t) => t,
            None => return,
        };
        if gt == term && index >= self.offset {
            let drop = (index - self.offset + 1) as usize;
            self.entries.drain(0..drop.min(self.entries.len()));
            self.offset = index + 1;
        }
    }

    pub fn stable_snapshot_to(&mut self, index: Index) {
        if self.snapshot_index == Some(index) {
            self.snapshot_index = None;
            self.snapshot_term = None;
        }
    }

    /// Appends `new_entries` after truncating any conflicting unstable tail,
    /// following the original's three-way branch: a pure append when the new
    /// entries start exactly where the tail ends, a full replace when they
    /// start at or before our offset, and a slice-then-append when they
    /// start strictly inside our current tail.
    pub fn truncate_and_append(&mut self, new_entries: &[Entry]) {
        if new_entries.is_empty() {
            return;
        }
        let after_index = new_entries[0].index;
        let num = self.entries.len() as u64;

        if after_index == self.offset + num {
            self.entries.extend_from_slice(new_entries);
        } else if after_index <= self.offset {
            self.offset = after_index;
            self.entries = new_entries.to_vec();
        } else {
            let keep = self.slice(self.offset, after_index);
            self.entries = keep;
            self.entries.extend_from_slice(new_entries);
        }
    }

    /// Returns entries in `[lo, hi)`, panicking if the range is out of the
    /// bounds this unstable log can serve (mirrors `mustCheckOutOfBounds`).
    pub fn slice(&self, lo: Index, hi: Index) -> Vec<Entry> {
        self.must_check_out_of_bounds(lo, hi);
        let start = (lo - self.offset) as usize;
        let end = (hi - self.offset) as usize;
        self.entries[start..end].to_vec()
    }

    fn must_check_out_of_bounds(&self, lo: Index, hi: Index) {
        if lo > hi {
            panic!("unstable log slice: invalid range [{}, {})", lo, hi);
        }
        let upper = self.offset + self.entries.len() as u64;
        if lo < self.offset || hi > upper {
            panic!(
                "unstable log slice [{}, {}) out of bound [{}, {})",
                lo, hi, self.offset, upper
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(term: Term, index: Index) -> Entry {
        Entry::new_blank(term, index)
    }

    #[test]
    fn maybe_last_index_empty_is_none() {
        let u = UnstableLog::new(0);
        assert_eq!(u.maybe_last_index(), None);
    }

    #[test]
    fn append_then_maybe_last_index() {
        let mut u = UnstableLog::new(0);
        u.truncate_and_append(&[e(1, 1), e(1, 2)]);
        assert_eq!(u.maybe_last_index(), Some(2));
        assert_eq!(u.maybe_term(2), Some(1));
    }

    #[test]
    fn stable_to_advances_offset_to_i_plus_one_not_plus_equals_one() {
        let mut u = UnstableLog::new(0);
        u.truncate_and_append(&[e(1, 1), e(1, 2), e(1, 3)]);
        // Marking index 3 stable in one call must drop all three entries,
        // not just advance offset by one as the historical `offset += 1` bug would.
        u.stable_to(3, 1);
        assert_eq!(u.offset(), 4);
        assert!(u.entries().is_empty());
    }

    #[test]
    fn stable_to_ignores_term_mismatch() {
        let mut u = UnstableLog::new(0);
        u.truncate_and_append(&[e(1, 1)]);
        u.stable_to(1, 2);
        assert_eq!(u.offset(), 1);
        assert_eq!(u.entries().len(), 1);
    }

    #[test]
    fn truncate_and_append_replaces_conflicting_tail() {
        let mut u = UnstableLog::new(0);
        u.truncate_and_append(&[e(1, 1), e(1, 2), e(1, 3)]);
        u.truncate_and_append(&[e(2, 2), e(2, 3)]);
        assert_eq!(u.entries()[0].term, 1);
        assert_eq!(u.entries()[1].term, 2);
        assert_eq!(u.entries()[2].term, 2);
        assert_eq!(u.maybe_last_index(), Some(3));
    }
}
