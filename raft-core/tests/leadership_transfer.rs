//! Leadership transfer: the current leader hands off to a caught-up voter
//! via a forced, lease-bypassing election, without ever leaving the cluster
//! with two simultaneous leaders.

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
fn transfer_to_a_caught_up_follower_completes_within_one_election_timeout() {
    let mut cluster = Cluster::new(&[1, 2, 3], test_config());
    assert!(cluster.elect(1, 20));
    let leader = cluster.leaders()[0];
    let target = [1u64, 2, 3].into_iter().find(|id| *id != leader).unwrap();

    // Let the target fully catch up on the leader's initial blank entry
    // before transferring, so the transfer fires immediately rather than
    // waiting on replication.
    for _ in 0..10 {
        cluster.tick_all_and_drain();
    }

    cluster.transfer_leadership(leader, target).expect("transfer starts");
    for _ in 0..10 {
        cluster.tick_all_and_drain();
        if cluster.nodes[&target].is_leader() {
            break;
        }
    }

    assert!(cluster.nodes[&target].is_leader(), "transfer target should become leader");
    assert!(!cluster.nodes[&leader].is_leader(), "old leader must step down once the transfer completes");
    assert_eq!(cluster.leaders(), vec![target], "exactly one leader after the handoff");
}

#[test]
fn leader_refuses_a_transfer_to_an_unknown_node() {
    let mut cluster = Cluster::new(&[1, 2, 3], test_config());
    assert!(cluster.elect(1, 20));
    let leader = cluster.leaders()[0];

    let err = cluster.transfer_leadership(leader, 99).expect_err("99 is not a voter in this group");
    assert!(matches!(err, raft_core::RaftError::UnknownNode(99)));
}
