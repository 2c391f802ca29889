//! Literal scenario: a one-node cluster is its own quorum. §8's "vote for
//! self at term 1 on a single-node cluster elects immediately" extends to
//! commit: a single voter's own match_index already constitutes a majority,
//! so it must not wait for a peer ack (there is none) to advance `committed`.
//!
//! Grounded in the teacher's restart/bootstrap-on-empty-cluster tests
//! (`examples/simon-fu-async-raft/async-raft/tests/`), re-expressed against
//! the synchronous `support::Cluster` harness for this crate's sole-voter
//! case.

mod support;

use raft_core::Config;
use support::Cluster;

fn test_config() -> Config {
    Config::builder()
        .election_timeout_min(5)
        .election_timeout_max(6)
        .heartbeat_interval(1)
        .build()
        .expect("valid config")
}

#[test]
fn single_voter_leader_commits_its_own_term_boundary_entry() {
    let mut cluster = Cluster::new(&[1], test_config());
    assert!(cluster.elect(1, 20), "sole voter should win an election within 20 ticks");

    // No peer exists to ack the leader's term-boundary blank entry; a
    // self-quorum of one must still advance commit past it.
    let metrics = cluster.nodes[&1].metrics();
    assert!(metrics.committed >= metrics.last_log_index, "sole voter should commit its own term-boundary entry");
}

#[test]
fn single_voter_leader_commits_and_applies_a_proposal_without_any_peer_ack() {
    let mut cluster = Cluster::new(&[1], test_config());
    assert!(cluster.elect(1, 20));

    let index = cluster.propose(1, b"hello".to_vec()).expect("sole voter should accept a proposal");

    let metrics = cluster.nodes[&1].metrics();
    assert!(metrics.committed >= index, "sole voter should commit its own proposal immediately");
    assert!(metrics.last_applied >= index, "sole voter should apply its own committed proposal immediately");
}
