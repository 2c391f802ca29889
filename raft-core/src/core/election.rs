//! Pre-vote, campaigning and vote counting.
//!
//! Grounded in `examples/simon-fu-async-raft/async-raft/src/core/mod.rs`'s
//! `CandidateState`/election-timeout handling, generalized to run pre-vote
//! before ever incrementing `current_term` — the teacher does not implement
//! pre-vote; this follows the design and etcd-raft's `campaign(campaignPreElection)`.

use tracing::info;

use crate::core::{CandidateState, Raft};
use crate::fsm::Fsm;
use crate::message::{ElectionKind, Message, MessageBody, VoteRequest, VoteResponse};
use crate::storage::{LogStore, StateManager};
use crate::{NodeId, Term};

impl<S: LogStore, M: StateManager, F: Fsm> Raft<S, M, F> {
    /// Starts an election: pre-vote first if configured, otherwise a real
    /// campaign directly. Single-voter groups win immediately without
    /// sending any messages, since a node always votes for itself.
    pub(crate) fn campaign(&mut self) {
        self.campaign_inner(false);
    }

    /// A forced campaign: the immediate, non-pre-vote election a leadership
    /// transfer target runs on receiving `TimeoutNow`, bypassing both
    /// pre-vote and every voter's checkQuorum lease (the design).
    pub(crate) fn campaign_forced(&mut self) {
        self.campaign_inner(true);
    }

    fn campaign_inner(&mut self, force: bool) {
        if !self.tracker.conf().contains_voter(self.id) {
            return;
        }
        if self.config.pre_vote && !force {
            self.start_election(ElectionKind::PreVote, false);
        } else {
            self.start_election(ElectionKind::Campaign, force);
        }
    }

    fn start_election(&mut self, kind: ElectionKind, force: bool) {
        match kind {
            ElectionKind::PreVote => self.become_pre_candidate(),
            ElectionKind::Campaign => self.become_candidate(),
        }
        let term_for_votes = if kind == ElectionKind::PreVote { self.current_term + 1 } else { self.current_term };
        let last_log_index = self.log.last_index();
        let last_log_term = self.log.last_term();

        let voters: Vec<NodeId> = self.tracker.conf().all_voters().into_iter().collect();
        let mut self_granted = false;
        for id in &voters {
            if *id == self.id {
                self_granted = true;
                continue;
            }
            self.send(
                *id,
                MessageBody::Vote(VoteRequest {
                    election_kind: kind,
                    last_log_index,
                    last_log_term,
                    force,
                }),
            );
        }
        if self_granted {
            self.record_vote(self.id, kind, true, term_for_votes);
        }
    }

    pub(crate) fn handle_vote_request(&mut self, from: NodeId, _term: Term, req: VoteRequest) {
        let last_log_index = self.log.last_index();
        let last_log_term = self.log.last_term();
        let log_ok = req.last_log_term > last_log_term || (req.last_log_term == last_log_term && req.last_log_index >= last_log_index);

        let in_lease = !req.force
            && self.config.check_quorum
            && self.leader_id.is_some()
            && self.leader_id != Some(from)
            && matches!(&self.role, crate::core::Role::Follower(s) if s.election_elapsed < self.config.election_timeout_min);

        let can_grant = match req.election_kind {
            ElectionKind::PreVote => log_ok && !in_lease,
            ElectionKind::Campaign => log_ok && !in_lease && (self.voted_for.is_none() || self.voted_for == Some(from)),
        };

        if can_grant && req.election_kind == ElectionKind::Campaign {
            self.voted_for = Some(from);
            let term = self.current_term;
            self.become_follower(term, self.leader_id);
        }

        info!(node = self.id, %from, election_kind = ?req.election_kind, granted = can_grant, "vote request handled");
        self.send(
            from,
            MessageBody::VoteResp(VoteResponse {
                election_kind: req.election_kind,
                vote_granted: can_grant,
            }),
        );
    }

    pub(crate) fn handle_vote_response(&mut self, from: NodeId, msg_term: Term, resp: VoteResponse) {
        let expected_term = if resp.election_kind == ElectionKind::PreVote {
            self.current_term + 1
        } else {
            self.current_term
        };
        if msg_term != 0 && resp.election_kind == ElectionKind::Campaign && msg_term != self.current_term {
            return;
        }
        self.record_vote(from, resp.election_kind, resp.vote_granted, expected_term);
    }

    fn record_vote(&mut self, from: NodeId, kind: ElectionKind, granted: bool, expected_term: Term) {
        let is_matching_role = matches!(
            (&self.role, kind),
            (crate::core::Role::PreCandidate(_), ElectionKind::PreVote) | (crate::core::Role::Candidate(_), ElectionKind::Campaign)
        );
        if !is_matching_role {
            return;
        }
        let (votes, rejections) = match &mut self.role {
            crate::core::Role::PreCandidate(s) | crate::core::Role::Candidate(s) => (&mut s.votes, &mut s.rejections),
            _ => return,
        };
        if granted {
            votes.insert(from);
        } else {
            rejections.insert(from);
        }
        let votes = votes.clone();
        let rejections = rejections.clone();

        if self.tracker.vote_quorum(&votes) {
            match kind {
                ElectionKind::PreVote => {
                    info!(node = self.id, term = expected_term, "pre-vote quorum reached, starting real campaign");
                    self.start_real_campaign();
                }
                ElectionKind::Campaign => {
                    info!(node = self.id, term = self.current_term, "election won, becoming leader");
                    self.become_leader();
                }
            }
        } else if self.tracker.vote_quorum(&rejections) {
            info!(node = self.id, ?kind, "election lost, reverting to follower");
            let term = self.current_term;
            self.become_follower(term, None);
        }
    }

    fn start_real_campaign(&mut self) {
        self.start_election(ElectionKind::Campaign, false);
    }

    pub(crate) fn handle_timeout_now(&mut self) {
        info!(node = self.id, "received TimeoutNow, starting immediate forced campaign");
        self.campaign_forced();
    }
}
