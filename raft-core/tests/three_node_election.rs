//! Literal scenario: three voters, one isolated network partition, and the
//! basic Election Safety / Leader Append-Only properties from §8.
//!
//! Grounded in the teacher's `raft_3_nodes_network_partition` style tests
//! (`examples/simon-fu-async-raft/async-raft/tests/`), re-expressed against
//! the synchronous `support::Cluster` harness instead of the teacher's
//! tokio `RaftRouter`.

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
fn three_node_election_elects_a_single_leader() {
    let mut cluster = Cluster::new(&[1, 2, 3], test_config());
    assert!(cluster.elect(1, 20), "node 1 should win an election within 20 ticks");

    let leaders = cluster.leaders();
    assert_eq!(leaders, vec![1], "exactly one node should be leader (election safety)");
    assert_eq!(cluster.current_term(2), cluster.current_term(1));
    assert_eq!(cluster.current_term(3), cluster.current_term(1));
}

#[test]
fn leader_reelected_after_partition_heals_keeps_a_single_leader() {
    let mut cluster = Cluster::new(&[1, 2, 3], test_config());
    assert!(cluster.elect(1, 20));

    // Partition the leader away; the remaining two-node majority should
    // elect a new leader among themselves.
    cluster.isolate(1);
    assert!(cluster.elect(2, 40) || cluster.elect(3, 40), "majority side should elect a new leader");

    let majority_leaders: Vec<_> = cluster.leaders().into_iter().filter(|id| *id != 1).collect();
    assert_eq!(majority_leaders.len(), 1, "exactly one leader among the connected majority");

    // Healing the partition must not produce two simultaneous leaders: the
    // old leader's term is stale, so on first contact it steps down.
    cluster.heal(1);
    for _ in 0..10 {
        cluster.tick_all_and_drain();
    }
    let leaders = cluster.leaders();
    assert_eq!(leaders.len(), 1, "exactly one leader after the partition heals (election safety)");
}

#[test]
fn candidate_without_quorum_never_becomes_leader() {
    // Isolate two of three nodes from each other and from the third; no
    // side has a majority, so nobody should ever become leader.
    let mut cluster = Cluster::new(&[1, 2, 3], test_config());
    cluster.isolate(2);
    cluster.isolate(3);

    for _ in 0..30 {
        cluster.tick_all_and_drain();
    }
    assert!(cluster.leaders().is_empty(), "no quorum exists, so no node should ever become leader");
}
