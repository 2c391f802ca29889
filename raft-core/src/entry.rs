//! Log entry types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::membership::Configuration;
use crate::{Index, Term};

/// Distinguishes a normal application entry from one carrying a
/// configuration change. Mirrors the teacher's `EntryPayload<D>` enum, but
/// an `Entry` here is never generic over application data: the payload is
/// always an opaque, immutable byte buffer handed back to the FSM untouched.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum EntryKind {
    /// A no-op entry appended by a new leader to commit across the term
    /// boundary, per the Leader Completeness property.
    Blank,
    /// An application-defined command, opaque to this crate.
    Normal,
    /// A joint-consensus configuration change.
    ConfChange,
}

/// A byte-buffer payload. Wrapping `bytes::Bytes` gives entries cheap,
/// reference-counted clones, so the same entry can live in the unstable log
/// tail and in one or more outbound append messages simultaneously without
/// copying its bytes.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct EntryPayload(#[serde(with = "bytes_serde")] pub Bytes);

impl EntryPayload {
    pub fn new(bytes: Bytes) -> Self {
        Self(bytes)
    }

    pub fn empty() -> Self {
        Self(Bytes::new())
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }
}

impl From<Bytes> for EntryPayload {
    fn from(b: Bytes) -> Self {
        Self(b)
    }
}

impl From<Vec<u8>> for EntryPayload {
    fn from(v: Vec<u8>) -> Self {
        Self(Bytes::from(v))
    }
}

pub(crate) mod bytes_serde {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(b: &Bytes, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(b.as_ref())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes, D::Error> {
        let v = Vec::<u8>::deserialize(d)?;
        Ok(Bytes::from(v))
    }
}

/// A single replicated log entry: a (term, index) identity, a kind, and an
/// opaque payload. When `kind` is [`EntryKind::ConfChange`], `conf` carries
/// the joint configuration this entry transitions to; it is `None`
/// otherwise.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub term: Term,
    pub index: Index,
    pub kind: EntryKind,
    pub payload: EntryPayload,
    pub conf: Option<Configuration>,
}

impl Default for EntryKind {
    fn default() -> Self {
        EntryKind::Normal
    }
}

impl Entry {
    pub fn new_blank(term: Term, index: Index) -> Self {
        Self {
            term,
            index,
            kind: EntryKind::Blank,
            payload: EntryPayload::empty(),
            conf: None,
        }
    }

    pub fn new_normal(term: Term, index: Index, payload: EntryPayload) -> Self {
        Self {
            term,
            index,
            kind: EntryKind::Normal,
            payload,
            conf: None,
        }
    }

    pub fn new_conf_change(term: Term, index: Index, payload: EntryPayload, conf: Configuration) -> Self {
        Self {
            term,
            index,
            kind: EntryKind::ConfChange,
            payload,
            conf: Some(conf),
        }
    }

    pub fn log_id(&self) -> crate::LogId {
        crate::LogId::new(self.term, self.index)
    }
}
