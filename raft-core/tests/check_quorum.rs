//! checkQuorum: a leader that loses contact with a majority of voters must
//! step down on its own rather than keep serving stale reads/writes.

mod support;

use raft_core::Config;
use support::Cluster;

fn test_config() -> Config {
    Config::builder()
        .election_timeout_min(5)
        .election_timeout_max(6)
        .heartbeat_interval(1)
        .check_quorum(true)
        .build()
        .expect("valid config")
}

#[test]
fn leader_steps_down_after_losing_a_quorum_of_voters() {
    let mut cluster = Cluster::new(&[1, 2, 3], test_config());
    assert!(cluster.elect(1, 20));
    let leader = cluster.leaders()[0];

    // Isolate both followers; the leader now sees activity from nobody but
    // itself, a minority of the 3-node group.
    for &id in &[1u64, 2, 3] {
        if id != leader {
            cluster.isolate(id);
        }
    }

    let mut stepped_down = false;
    for _ in 0..20 {
        cluster.tick_and_drain(leader);
        if !cluster.nodes[&leader].is_leader() {
            stepped_down = true;
            break;
        }
    }
    assert!(stepped_down, "leader must step down once checkQuorum finds no quorum of recent activity");
}

#[test]
fn leader_in_contact_with_a_quorum_never_steps_down() {
    let mut cluster = Cluster::new(&[1, 2, 3], test_config());
    assert!(cluster.elect(1, 20));
    let leader = cluster.leaders()[0];

    // Fully connected cluster: heartbeats and their replies keep checkQuorum
    // satisfied indefinitely.
    for _ in 0..50 {
        cluster.tick_all_and_drain();
    }
    assert!(cluster.nodes[&leader].is_leader(), "a leader in contact with a quorum must never step down");
}
