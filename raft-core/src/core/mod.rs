//! The core Raft role state machine: term/vote/log bookkeeping and the
//! synchronous `step`/`tick` dispatch loop.
//!
//! The teacher (`examples/simon-fu-async-raft/async-raft/src/core/mod.rs`)
//! runs each role (`Follower`, `Candidate`, `Leader`, `NonVoter`) as its own
//! tokio task looping on `select!` over timers and channels. This crate
//! forbids that: the core must never block on I/O or own a background task, so
//! `Role` is instead a plain enum switched on by one synchronous `step`
//! call per inbound message and one `tick` call per timer tick, matching
//! the "role-keyed step dispatch" design note. The supplementary idiom for
//! a synchronous, command-output Raft engine is openraft's `Engine<C>`
//! (`examples/other_examples/...openraft-src-engine-engine_impl.rs.rs`).

pub mod election;
pub mod replication;
pub mod transfer;

use std::collections::BTreeSet;

use tracing::{info, instrument, warn};

use crate::confchange::PendingConfTracker;
use crate::config::Config;
use crate::entry::{Entry, EntryKind, EntryPayload};
use crate::error::RaftError;
use crate::fsm::{Fsm, Role as FsmRole};
use crate::log::RaftLog;
use crate::membership::{ConfChangeSingle, Configuration};
use crate::message::{ElectionKind, Message, MessageBody, ReadIndexRequest, ReadIndexResponse, VoteResponse};
use crate::progress::tracker::ProgressTracker;
use crate::storage::{ClusterState, LogStore, ServerState, StateManager};
use crate::{GroupId, Index, NodeId, Term};

/// Which role this node currently occupies. Transitions are driven by
/// election timeouts, vote outcomes and incoming messages with a higher
/// term — never by anything outside `step`/`tick`.
#[derive(Clone, Debug)]
pub enum Role {
    Follower(FollowerState),
    PreCandidate(CandidateState),
    Candidate(CandidateState),
    Leader(LeaderState),
}

impl Role {
    pub fn as_fsm_role(&self) -> FsmRole {
        match self {
            Role::Follower(_) => FsmRole::Follower,
            Role::PreCandidate(_) => FsmRole::PreCandidate,
            Role::Candidate(_) => FsmRole::Candidate,
            Role::Leader(_) => FsmRole::Leader,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FollowerState {
    /// Ticks elapsed since the last message from a recognized leader.
    pub election_elapsed: u64,
    /// The randomized threshold `election_elapsed` must reach to campaign.
    pub election_timeout: u64,
}

#[derive(Clone, Debug, Default)]
pub struct CandidateState {
    pub election_elapsed: u64,
    pub election_timeout: u64,
    pub votes: BTreeSet<NodeId>,
    pub rejections: BTreeSet<NodeId>,
}

#[derive(Clone, Debug, Default)]
pub struct LeaderState {
    pub heartbeat_elapsed: u64,
    /// Ticks since `checkQuorum` last evaluated quorum activity. Checked
    /// and reset once per `election_timeout_min`, not every tick — a reply
    /// to this tick's heartbeat cannot possibly arrive before the next
    /// tick, so evaluating every tick would flap the leader under any real
    /// network latency.
    pub check_quorum_elapsed: u64,
    /// Set while a leadership transfer is in progress; the target node and
    /// how many ticks remain before the attempt is abandoned.
    pub transferring_to: Option<NodeId>,
    pub transfer_elapsed: u64,
}

/// The full state of one Raft replica: identity, term/vote bookkeeping, the
/// replicated log, progress tracker (meaningful only while leader) and the
/// current role. Analogous to the teacher's `RaftCore`, but with no network,
/// storage-task or channel handles of its own — `Raft` is data, `step`/`tick`
/// are the only ways to change it, and every I/O callout goes through the
/// `LogStore`/`StateManager`/`Fsm` trait objects it's handed.
pub struct Raft<S: LogStore, M: StateManager, F: Fsm> {
    pub group_id: GroupId,
    pub id: NodeId,
    pub config: Config,
    pub current_term: Term,
    pub voted_for: Option<NodeId>,
    pub leader_id: Option<NodeId>,
    pub log: RaftLog<S>,
    pub state_mgr: M,
    pub fsm: F,
    pub tracker: ProgressTracker,
    pub pending_conf: PendingConfTracker,
    pub role: Role,
    pub out: Vec<Message>,
    stopped: bool,
}

impl<S: LogStore, M: StateManager, F: Fsm> Raft<S, M, F> {
    pub fn new(group_id: GroupId, id: NodeId, config: Config, log: RaftLog<S>, state_mgr: M, fsm: F, conf: Configuration) -> Self {
        let next_index = log.last_index() + 1;
        let tracker = ProgressTracker::new(conf, next_index);
        let election_timeout = config.new_rand_election_timeout();
        Self {
            group_id,
            id,
            config,
            current_term: 0,
            voted_for: None,
            leader_id: None,
            log,
            state_mgr,
            fsm,
            tracker,
            pending_conf: PendingConfTracker::default(),
            role: Role::Follower(FollowerState {
                election_elapsed: 0,
                election_timeout,
            }),
            out: Vec::new(),
            stopped: false,
        }
    }

    pub fn is_leader(&self) -> bool {
        matches!(self.role, Role::Leader(_))
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    fn send(&mut self, to: NodeId, body: MessageBody) {
        self.out.push(Message {
            group_id: self.group_id,
            from: self.id,
            to,
            term: self.current_term,
            body,
        });
    }

    fn persist_hard_state(&mut self) -> Result<(), RaftError> {
        self.state_mgr
            .save_server_state(&crate::storage::ServerState {
                current_term: self.current_term,
                voted_for: self.voted_for,
                last_applied: self.log.applied(),
            })
            .map_err(|e| RaftError::Store(e.to_string()))
    }

    fn persist_cluster_state(&mut self, conf_index: Index) -> Result<(), RaftError> {
        self.state_mgr
            .save_cluster_state(&ClusterState {
                conf: self.tracker.conf().clone(),
                conf_index,
            })
            .map_err(|e| RaftError::Store(e.to_string()))
    }

    /// Restores role/term/vote/config state from durable storage on startup,
    /// per `syncRaftStart`'s ordering: open the log, read server state, read
    /// cluster state, seed the tracker, then settle on an initial role.
    pub fn restore(&mut self, server: ServerState, cluster: ClusterState) -> Result<(), RaftError> {
        self.current_term = server.current_term;
        self.voted_for = server.voted_for;
        self.log.set_applied(server.last_applied);
        let next_index = self.log.last_index() + 1;
        self.tracker.set_conf(cluster.conf.clone(), next_index);

        if !self.tracker.conf().contains_voter(self.id) {
            // Non-voting observer: remains a follower indefinitely, never campaigns.
            self.role = Role::Follower(FollowerState {
                election_elapsed: 0,
                election_timeout: u64::MAX,
            });
        } else if self.tracker.conf().all_voters().len() == 1 && self.tracker.conf().contains_voter(self.id) && self.log.last_index() > 0 {
            info!(node = self.id, "single-voter group, becoming leader immediately on restore");
            self.become_leader();
        } else {
            self.become_follower(self.current_term, self.leader_id);
        }
        Ok(())
    }

    /// Advances ticks since the last timer fire. One call corresponds to one
    /// unit of the host's timer wheel — what that unit represents in wall
    /// time is entirely the host's choice.
    #[instrument(level = "debug", skip(self))]
    pub fn tick(&mut self) -> Vec<Message> {
        if self.stopped {
            return Vec::new();
        }
        match &mut self.role {
            Role::Follower(_) | Role::PreCandidate(_) | Role::Candidate(_) => self.tick_election(),
            Role::Leader(_) => self.tick_leader(),
        }
        std::mem::take(&mut self.out)
    }

    fn tick_election(&mut self) {
        let (elapsed, timeout) = match &mut self.role {
            Role::Follower(s) => {
                s.election_elapsed += 1;
                (s.election_elapsed, s.election_timeout)
            }
            Role::PreCandidate(s) | Role::Candidate(s) => {
                s.election_elapsed += 1;
                (s.election_elapsed, s.election_timeout)
            }
            Role::Leader(_) => unreachable!(),
        };
        if elapsed >= timeout {
            self.campaign();
        }
    }

    fn tick_leader(&mut self) {
        let (fire_heartbeat, check_quorum_now) = if let Role::Leader(s) = &mut self.role {
            s.heartbeat_elapsed += 1;
            s.check_quorum_elapsed += 1;
            if let Some(target) = s.transferring_to {
                s.transfer_elapsed += 1;
                if s.transfer_elapsed >= self.config.election_timeout_min {
                    warn!(node = self.id, %target, "leadership transfer timed out, resuming normal operation");
                    s.transferring_to = None;
                    s.transfer_elapsed = 0;
                }
            }
            let fire_heartbeat = if s.heartbeat_elapsed >= self.config.heartbeat_interval {
                s.heartbeat_elapsed = 0;
                true
            } else {
                false
            };
            // checkQuorum is evaluated once per election_timeout, not every
            // tick: a reply to this tick's heartbeat cannot possibly have
            // arrived yet, so checking more often would flap the leader.
            let check_quorum_now = s.check_quorum_elapsed >= self.config.election_timeout_min;
            if check_quorum_now {
                s.check_quorum_elapsed = 0;
            }
            (fire_heartbeat, check_quorum_now)
        } else {
            (false, false)
        };
        if fire_heartbeat {
            self.broadcast_heartbeat();
        }
        if check_quorum_now {
            if self.config.check_quorum && !self.tracker.active_quorum() {
                warn!(node = self.id, term = self.current_term, "checkQuorum: lost contact with a quorum of voters, stepping down");
                let term = self.current_term;
                self.become_follower(term, None);
                return;
            }
            self.tracker.reset_recent_active();
            // The leader always has activity from itself; it never
            // receives its own heartbeat reply to set this otherwise.
            if let Some(me) = self.tracker.get_mut(self.id) {
                me.recent_active = true;
            }
        }
        self.replicate_all();
    }

    /// Dispatches one inbound message and returns whatever outbound
    /// messages it produced. Dispatch is an exhaustive match over
    /// `self.role`, never a reassigned function pointer.
    #[instrument(level = "debug", skip(self, msg), fields(from = msg.from, term = msg.term))]
    pub fn step(&mut self, msg: Message) -> Vec<Message> {
        if self.stopped {
            return Vec::new();
        }
        if let Err(e) = self.pre_handle_term(&msg) {
            warn!(node = self.id, error = %e, "dropping message after term pre-handling");
            return std::mem::take(&mut self.out);
        }
        match msg.body {
            MessageBody::Vote(ref req) => self.handle_vote_request(msg.from, msg.term, req.clone()),
            MessageBody::VoteResp(ref resp) => self.handle_vote_response(msg.from, msg.term, resp.clone()),
            MessageBody::Append(ref req) => self.handle_append_entries(msg.from, msg.term, req.clone()),
            MessageBody::AppendResp(ref resp) => self.handle_append_response(msg.from, resp.clone()),
            MessageBody::Heartbeat(ref req) => self.handle_heartbeat(msg.from, req.clone()),
            MessageBody::HeartbeatResp(ref resp) => self.handle_heartbeat_response(msg.from, resp.clone()),
            MessageBody::InstallSnapshot(ref req) => self.handle_install_snapshot(msg.from, req.clone()),
            MessageBody::InstallSnapshotResp(ref resp) => self.handle_install_snapshot_response(msg.from, resp.clone()),
            MessageBody::ReadIndex(ref req) => self.handle_read_index(msg.from, req.clone()),
            MessageBody::ReadIndexResp(ref resp) => self.handle_read_index_response(msg.from, resp.clone()),
            MessageBody::TimeoutNow => self.handle_timeout_now(),
        }
        std::mem::take(&mut self.out)
    }

    /// Applies the message pre-handling term rules: reject stale-term
    /// messages outright (except that a candidate/leader always accepts a
    /// pre-vote request regardless of its own term, since granting a
    /// pre-vote never costs anything), step down to follower on any message
    /// carrying a higher term, and refuse to grant votes (pre- or real)
    /// while a checkQuorum lease believes the current leader is still alive.
    fn pre_handle_term(&mut self, msg: &Message) -> Result<(), RaftError> {
        if msg.term == 0 {
            // Internal messages (ReadIndex replies routed locally, TimeoutNow) carry no term.
            return Ok(());
        }
        if msg.term < self.current_term {
            if msg.is_pre_vote() {
                // Never let a stale pre-vote storm stick around: reject outright.
                self.send(
                    msg.from,
                    MessageBody::VoteResp(VoteResponse {
                        election_kind: ElectionKind::PreVote,
                        vote_granted: false,
                    }),
                );
            } else if msg.is_vote_like() {
                self.send(
                    msg.from,
                    MessageBody::VoteResp(VoteResponse {
                        election_kind: ElectionKind::Campaign,
                        vote_granted: false,
                    }),
                );
            } else if self.config.check_quorum && matches!(&msg.body, MessageBody::Append(_) | MessageBody::Heartbeat(_)) {
                // Inform a stale leader of our higher term so it steps down faster.
                self.send(
                    msg.from,
                    MessageBody::AppendResp(crate::message::AppendEntriesResponse {
                        success: false,
                        conflict: None,
                        last_log_index: self.log.last_index(),
                    }),
                );
            }
            return Err(RaftError::Store(format!("stale term {} < {}", msg.term, self.current_term)));
        }
        if msg.term > self.current_term {
            if msg.is_pre_vote() {
                // Pre-votes never bump our term; that's the entire point of pre-vote.
                return Ok(());
            }
            let becomes_follower = !matches!(&msg.body, MessageBody::VoteResp(_));
            if becomes_follower {
                // Adopt the sender as leader only for Append/Heartbeat/InstallSnapshot.
                // The original C check this was ported from had a constant-truthy
                // third disjunct that made this adoption unconditional; fixed here.
                let adopt_as_leader = matches!(
                    &msg.body,
                    MessageBody::Append(_) | MessageBody::Heartbeat(_) | MessageBody::InstallSnapshot(_)
                );
                info!(node = self.id, new_term = msg.term, "stepping down: observed higher term");
                let new_leader = if adopt_as_leader { Some(msg.from) } else { None };
                self.become_follower(msg.term, new_leader);
            }
        }
        Ok(())
    }

    // --- Role transitions -------------------------------------------------

    pub fn become_follower(&mut self, term: Term, leader_id: Option<NodeId>) {
        if term > self.current_term {
            self.current_term = term;
            self.voted_for = None;
        }
        self.leader_id = leader_id;
        let election_timeout = self.config.new_rand_election_timeout();
        self.role = Role::Follower(FollowerState {
            election_elapsed: 0,
            election_timeout,
        });
        let _ = self.persist_hard_state();
        let _ = self.fsm.on_role_changed(FsmRole::Follower, self.leader_id);
    }

    /// Steps down to `Follower` and records `from` as leader unless we are
    /// already a follower recognizing that same leader, in which case this
    /// just resets the election clock — called on every valid
    /// Append/Heartbeat/InstallSnapshot from a current-term leader.
    pub(crate) fn acknowledge_leader(&mut self, from: NodeId) {
        match &mut self.role {
            Role::Follower(s) if self.leader_id == Some(from) => {
                s.election_elapsed = 0;
            }
            _ => {
                let term = self.current_term;
                self.become_follower(term, Some(from));
            }
        }
    }

    /// Appends `entries` to the log and immediately hands the tail to the
    /// durable store. The store is synchronous and treated as infallible
    ///, so there is no separate async "stable" notification:
    /// the write-through happens in the same call that appends.
    pub(crate) fn append_and_persist(&mut self, entries: Vec<Entry>) {
        // A conf-change entry's new configuration takes effect as soon as it
        // is appended, not when it commits: joint consensus requires the
        // entry's own commit to be decided under the *new* membership, so
        // every node that appends it (leader or follower) must switch its
        // tracker over right away, same as etcd-raft's applyConfChange.
        // `self.tracker` is leader-only bookkeeping but every node keeps one
        // warm so it has the right quorum view the moment it becomes leader.
        if let Some(conf_entry) = entries.iter().rev().find(|e| e.kind == EntryKind::ConfChange) {
            if let Some(conf) = conf_entry.conf.clone() {
                self.tracker.set_conf(conf, conf_entry.index + 1);
            }
        }
        if let Some(last) = entries.last() {
            let (term, index) = (last.term, last.index);
            if let Err(e) = self.log.append(entries) {
                warn!(node = self.id, error = %e, "failed to append entries to the log");
                return;
            }
            if let Err(e) = self.log.persist_to(index, term) {
                warn!(node = self.id, error = %e, "failed to persist appended entries");
            }
        }
    }

    fn become_pre_candidate(&mut self) {
        let election_timeout = self.config.new_rand_election_timeout();
        self.role = Role::PreCandidate(CandidateState {
            election_elapsed: 0,
            election_timeout,
            votes: BTreeSet::new(),
            rejections: BTreeSet::new(),
        });
        let _ = self.fsm.on_role_changed(FsmRole::PreCandidate, None);
    }

    fn become_candidate(&mut self) {
        self.current_term += 1;
        self.voted_for = Some(self.id);
        self.leader_id = None;
        let election_timeout = self.config.new_rand_election_timeout();
        self.role = Role::Candidate(CandidateState {
            election_elapsed: 0,
            election_timeout,
            votes: BTreeSet::new(),
            rejections: BTreeSet::new(),
        });
        let _ = self.persist_hard_state();
        let _ = self.fsm.on_role_changed(FsmRole::Candidate, None);
    }

    pub fn become_leader(&mut self) {
        self.leader_id = Some(self.id);
        let next_index = self.log.last_index() + 1;
        self.tracker.set_conf(self.tracker.conf().clone(), next_index);
        for id in self.tracker.conf().all_voters() {
            if let Some(p) = self.tracker.get_mut(id) {
                *p = crate::progress::Progress::new(next_index);
            }
        }
        if let Some(me) = self.tracker.get_mut(self.id) {
            me.matched_index = self.log.last_index();
            me.become_replicate();
            // The leader always has activity from itself, for checkQuorum's purposes.
            me.recent_active = true;
        }
        self.role = Role::Leader(LeaderState::default());
        // A new leader commits a blank entry to establish Leader Completeness
        // across the term boundary before any client entry can be considered safe.
        let term = self.current_term;
        let index = self.log.last_index() + 1;
        self.append_and_persist(vec![Entry::new_blank(term, index)]);
        let _ = self.persist_hard_state();
        let _ = self.fsm.on_role_changed(FsmRole::Leader, Some(self.id));
        // A single-voter group already has quorum on its own match_index the
        // instant the blank entry lands; without this, commit only ever
        // advances from `handle_append_response`, which a lone voter never
        // receives (there is no one else to ack).
        self.advance_commit_and_apply();
        self.replicate_all();
    }

    // --- Propose / reconfigure ---------------------------------------------

    /// Appends a client proposal to the leader's log and immediately drives
    /// replication, returning both the index it was appended at (`None` if
    /// this node is not the leader) and whatever outbound messages that
    /// produced — a proposal is a call like `step`/`tick`, not a queued
    /// side effect the host must separately flush on the next tick.
    pub fn propose(&mut self, payload: EntryPayload, _is_weak: bool) -> (Option<Index>, Vec<Message>) {
        if !self.is_leader() {
            return (None, Vec::new());
        }
        if let Role::Leader(s) = &self.role {
            if s.transferring_to.is_some() {
                // A leader mid-transfer stops accepting new proposals.
                return (None, Vec::new());
            }
        }
        let index = self.log.last_index() + 1;
        let term = self.current_term;
        self.append_and_persist(vec![Entry::new_normal(term, index, payload)]);
        if let Some(me) = self.tracker.get_mut(self.id) {
            me.maybe_update(index);
        }
        // A single-voter leader has quorum on its own `match_index` alone;
        // with no peer to ack an append, commit would otherwise never move.
        self.advance_commit_and_apply();
        self.replicate_all();
        (Some(index), std::mem::take(&mut self.out))
    }

    /// Proposes a joint-consensus configuration change. Refuses a second
    /// change while one is still uncommitted.
    pub fn propose_conf_change(&mut self, ops: Vec<ConfChangeSingle>) -> (Result<Index, crate::error::ConfChangeError>, Vec<Message>) {
        if !self.is_leader() {
            return (Err(crate::error::ConfChangeError::NotLeader(self.leader_id)), Vec::new());
        }
        if self.pending_conf.is_pending() {
            return (Err(crate::error::ConfChangeError::AlreadyInProgress), Vec::new());
        }
        if ops.is_empty() {
            return (Err(crate::error::ConfChangeError::Invalid("configuration change batch is empty".into())), Vec::new());
        }
        for op in &ops {
            let id = match op {
                ConfChangeSingle::AddVoter(id) | ConfChangeSingle::AddLearner(id) => *id,
                ConfChangeSingle::RemoveVoter(id) | ConfChangeSingle::RemoveLearner(id) => *id,
            };
            let removing = matches!(op, ConfChangeSingle::RemoveVoter(_) | ConfChangeSingle::RemoveLearner(_));
            if removing && !self.tracker.conf().contains(id) {
                return (Err(crate::error::ConfChangeError::UnknownNode(id)), Vec::new());
            }
        }
        let next_index = self.log.last_index() + 1;
        let new_conf = crate::confchange::enter_joint(self.tracker.conf(), &ops, true);
        let term = self.current_term;
        self.append_and_persist(vec![Entry::new_conf_change(term, next_index, EntryPayload::empty(), new_conf)]);
        self.pending_conf.mark_pending(next_index);
        if let Some(me) = self.tracker.get_mut(self.id) {
            me.maybe_update(next_index);
        }
        self.advance_commit_and_apply();
        self.replicate_all();
        (Ok(next_index), std::mem::take(&mut self.out))
    }

    // --- Commit / apply -----------------------------------------------------

    /// Recomputes the leader-visible commit index from the progress tracker
    /// and applies any newly committed entries to the FSM, in order,
    /// exactly once 
    fn advance_commit_and_apply(&mut self) {
        if self.is_leader() {
            let candidate = self.tracker.committed_index();
            // Leader Completeness: never commit an entry from a prior term
            // by counting replicas alone; only count once this term's own
            // entry has itself reached the candidate index.
            if let Some(term) = self.log.term(candidate) {
                if term == self.current_term {
                    self.log.maybe_commit(candidate);
                }
            }
        }
        self.apply_committed();
    }

    fn apply_committed(&mut self) {
        let applied = self.log.applied();
        let committed = self.log.committed();
        if applied >= committed {
            return;
        }
        let entries = match self.log.slice(applied + 1, committed + 1) {
            Ok(e) => e,
            Err(e) => {
                warn!(node = self.id, error = %e, "failed reading committed entries for apply");
                return;
            }
        };
        for entry in entries {
            match entry.kind {
                EntryKind::Blank => {}
                EntryKind::Normal => {
                    if let Err(e) = self.fsm.apply_log(entry.index, entry.payload.as_bytes()) {
                        warn!(node = self.id, index = entry.index, error = %e, "fsm apply_log failed");
                    }
                }
                EntryKind::ConfChange => {
                    if let Some(conf) = entry.conf.clone() {
                        let _ = self.fsm.on_cluster_changed(entry.index, &conf);
                        self.pending_conf.clear_if_at_or_before(entry.index);
                        if conf.is_joint() && conf.auto_leave && self.is_leader() && !self.pending_conf.is_pending() {
                            let leave = crate::confchange::leave_joint(&conf);
                            let next_index = self.log.last_index() + 1;
                            self.tracker.set_conf(leave.clone(), next_index);
                            let term = self.current_term;
                            self.append_and_persist(vec![Entry::new_conf_change(term, next_index, EntryPayload::empty(), leave)]);
                            self.pending_conf.mark_pending(next_index);
                            if let Some(me) = self.tracker.get_mut(self.id) {
                                me.maybe_update(next_index);
                            }
                        }
                    }
                }
            }
            self.log.set_applied(entry.index);
        }
        let _ = self.persist_hard_state();
        let _ = self.persist_cluster_state(self.log.applied());
        if self.is_leader() {
            self.replicate_all();
        }
    }

    fn handle_read_index(&mut self, from: NodeId, req: ReadIndexRequest) {
        if !self.is_leader() {
            return;
        }
        if !self.tracker.active_quorum() && self.config.check_quorum {
            // Lease not currently valid; drop rather than answer with a stale index.
            return;
        }
        let read_index = self.log.committed();
        self.send(
            from,
            MessageBody::ReadIndexResp(ReadIndexResponse {
                context: req.context,
                read_index,
            }),
        );
    }

    fn handle_read_index_response(&mut self, _from: NodeId, _resp: ReadIndexResponse) {
        // Routed back to the host by way of the outbound queue; the core
        // itself has no pending-read table to reconcile against.
    }
}
