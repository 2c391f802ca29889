//! Wire and internal message schema exchanged between replicas.
//!
//! Grounded in `examples/original_source/source/libs/sync/inc/sync_raft_message.h`'s
//! `ESyncRaftMessageType`/`RaftMsg_*` union, reshaped as a single Rust `enum`
//! with disjoint variants. The original C header assigns the numeric tag `3`
//! to both `RAFT_MSG_VOTE` and `RAFT_MSG_INTERNAL_BEAT` — an aliasing bug
//! flagged in the distilled specification's open questions. An `enum` with
//! independently constructed variants makes that class of bug unrepresentable:
//! there is no shared discriminant to alias.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entry::Entry;
use crate::membership::Configuration;
use crate::{GroupId, Index, NodeId, Term};

/// Distinguishes a real election campaign from a pre-vote probe. Carried on
/// both `Vote` and `VoteResp` so a responder can tell which phase a request
/// belongs to without consulting any other state (mirrors
/// `ESyncRaftElectionType`/`cType` in the original source).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ElectionKind {
    PreVote,
    Campaign,
}

/// A request to vote for the sender in the given term.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub election_kind: ElectionKind,
    pub last_log_index: Index,
    pub last_log_term: Term,
    /// Set only for the forced election a leadership transfer target sends
    /// after receiving `TimeoutNow`. A voter must grant a forced vote even
    /// while it still believes a current leader is alive.
    pub force: bool,
}

/// A response to a [`VoteRequest`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct VoteResponse {
    pub election_kind: ElectionKind,
    pub vote_granted: bool,
}

/// A leader's request to append entries to a follower's log, or (when
/// `entries` is empty) a heartbeat-with-probe.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AppendEntriesRequest {
    /// Index of the log entry immediately preceding `entries`.
    pub prev_log_index: Index,
    /// Term of the entry at `prev_log_index`.
    pub prev_log_term: Term,
    /// The leader's current commit index, for the follower to advance its own.
    pub leader_commit: Index,
    pub entries: Vec<Entry>,
}

/// The conflicting region a follower reports back on a rejected append, used
/// by the leader to jump `next_index` back to the real divergence point
/// instead of decrementing one index at a time.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConflictOpt {
    pub index: Index,
    pub term: Term,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AppendEntriesResponse {
    pub success: bool,
    /// Set when `success` is false: the conflicting (index, term) the leader
    /// should retry from.
    pub conflict: Option<ConflictOpt>,
    /// Echoes the highest index the follower now has durably logged, used by
    /// the leader to advance `match_index` on success.
    pub last_log_index: Index,
}

/// A content-free heartbeat, distinct from an empty `AppendEntriesRequest`
/// so a follower can answer without touching the log at all.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub leader_commit: Index,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    /// Echoes the follower's last log index, so a leader that has fallen
    /// behind on `match_index` bookkeeping (e.g. after its own restart) can
    /// notice without waiting for the next full append round.
    pub last_log_index: Index,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct InstallSnapshotRequest {
    pub last_included_index: Index,
    pub last_included_term: Term,
    pub conf: Configuration,
    /// Opaque, application-defined snapshot bytes from [`crate::fsm::Fsm::get_snapshot`].
    #[serde(with = "crate::entry::bytes_serde")]
    pub data: bytes::Bytes,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct InstallSnapshotResponse {
    pub last_log_index: Index,
}

/// A caller's request to establish a read-committed index without appending
/// an entry, answered once the leader is certain (via its checkQuorum lease)
/// that it is still the leader as of `commit_index` at request time. This is
/// additive to the distilled spec (see SPEC_FULL.md's read path supplement),
/// grounded in `RAFT_MSG_READ_INDEX` from the original source.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReadIndexRequest {
    /// Caller-supplied opaque correlation id, echoed back unchanged.
    pub context: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReadIndexResponse {
    pub context: u64,
    pub read_index: Index,
}

/// A single wire or internal message. `term`/`group_id`/`from`/`to` are
/// common envelope fields carried on every variant; the payload is modeled
/// as an enum rather than a tagged union, so message kinds can never collide
/// on a shared discriminant.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub group_id: GroupId,
    pub from: NodeId,
    pub to: NodeId,
    pub term: Term,
    pub body: MessageBody,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum MessageBody {
    Vote(VoteRequest),
    VoteResp(VoteResponse),
    Append(AppendEntriesRequest),
    AppendResp(AppendEntriesResponse),
    Heartbeat(HeartbeatRequest),
    HeartbeatResp(HeartbeatResponse),
    InstallSnapshot(InstallSnapshotRequest),
    InstallSnapshotResp(InstallSnapshotResponse),
    ReadIndex(ReadIndexRequest),
    ReadIndexResp(ReadIndexResponse),
    /// Asks the recipient to immediately start a campaign, skipping its
    /// remaining election timeout. Used for leadership transfer.
    TimeoutNow,
}

impl Message {
    pub fn is_vote_like(&self) -> bool {
        matches!(self.body, MessageBody::Vote(_) | MessageBody::VoteResp(_))
    }

    pub fn is_pre_vote(&self) -> bool {
        match &self.body {
            MessageBody::Vote(v) => v.election_kind == ElectionKind::PreVote,
            MessageBody::VoteResp(v) => v.election_kind == ElectionKind::PreVote,
            _ => false,
        }
    }
}

/// Voters participating in an in-progress election, tracked by the
/// candidate itself rather than carried on the wire.
pub type VoteTally = BTreeSet<NodeId>;
