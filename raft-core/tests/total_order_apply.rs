//! Client proposals replicate to every follower and apply in the same
//! order, exactly once, everywhere — §8's Commit Monotonicity and
//! Exactly-Once Apply properties.

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
fn proposals_replicate_and_apply_in_order_on_every_node() {
    let mut cluster = Cluster::new(&[1, 2, 3], test_config());
    assert!(cluster.elect(1, 20));
    let leader = cluster.leaders()[0];

    let mut indices = Vec::new();
    for i in 0..5u8 {
        let idx = cluster.propose(leader, vec![i]).expect("leader accepts proposal");
        indices.push(idx);
        cluster.tick_all_and_drain();
    }
    // A few extra rounds to let any lagging follower catch all the way up.
    for _ in 0..10 {
        cluster.tick_all_and_drain();
    }

    let ids: Vec<_> = cluster.nodes.keys().copied().collect();
    for id in ids {
        let driver = &cluster.nodes[&id];
        let fsm = driver.debug_fsm();
        for (i, &index) in indices.iter().enumerate() {
            let applied = fsm.get(index).unwrap_or_else(|| panic!("node {} missing entry at index {}", id, index));
            assert_eq!(applied.as_ref(), &[i as u8][..], "node {} applied the wrong payload at index {}", id, index);
        }
        assert!(fsm.last_applied() >= *indices.last().unwrap(), "node {} has not applied everything committed", id);
    }
}

#[test]
fn heartbeats_alone_never_advance_the_commit_index_past_the_leaders_blank_entry() {
    // A new leader commits exactly one blank entry to cross the term
    // boundary (Leader Completeness); absent further proposals the commit
    // index must then sit still forever, no matter how many heartbeats fly.
    let mut cluster = Cluster::new(&[1, 2, 3], test_config());
    assert!(cluster.elect(1, 20));
    let leader = cluster.leaders()[0];

    for _ in 0..10 {
        cluster.tick_all_and_drain();
    }
    let settled = cluster.nodes[&leader].metrics().committed;
    assert_eq!(settled, 1, "only the leader's own blank entry should have committed");

    for _ in 0..20 {
        cluster.tick_all_and_drain();
    }
    let metrics = cluster.nodes[&leader].metrics();
    assert_eq!(metrics.committed, settled, "commit index must not drift without new proposals");
}
