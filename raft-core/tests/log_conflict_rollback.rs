//! Literal scenario: a leader isolated after appending an entry that never
//! reaches a quorum must have that entry overwritten once a new leader is
//! elected on the other side of the partition and the old leader rejoins —
//! `onRollback` fires for the discarded entry and the index ends up holding
//! whatever the new leader committed there instead.

mod support;

use support::Cluster;

use raft_core::Config;

fn test_config() -> Config {
    Config::builder()
        .election_timeout_min(5)
        .election_timeout_max(6)
        .heartbeat_interval(1)
        .build()
        .expect("valid config")
}

#[test]
fn a_stranded_leaders_uncommitted_entry_is_rolled_back_and_replaced() {
    let mut cluster = Cluster::new(&[1, 2, 3], test_config());
    assert!(cluster.elect(1, 20));
    let old_leader = cluster.leaders()[0];
    let others: Vec<u64> = [1u64, 2, 3].into_iter().filter(|id| *id != old_leader).collect();

    // An entry proposed while the cluster is fully connected commits
    // everywhere before the partition below.
    let shared_index = cluster.propose(old_leader, vec![1u8]).expect("leader accepts proposal");
    for _ in 0..10 {
        cluster.tick_all_and_drain();
    }

    // Strand the leader: it can still append to its own log, but with no
    // quorum reachable the entry below can never commit.
    cluster.isolate(old_leader);
    let stranded_index = cluster.propose(old_leader, vec![0xAAu8]).expect("a leader accepts a proposal even if it can't replicate it");
    assert!(stranded_index > shared_index);
    for _ in 0..10 {
        cluster.tick_all_and_drain();
    }
    assert!(
        cluster.nodes[&old_leader].metrics().committed < stranded_index,
        "the stranded entry must never commit without a quorum"
    );

    // The majority side elects a leader of its own. That leader's own
    // term-boundary blank entry lands on the very index the stranded entry
    // occupied, since neither follower ever received it.
    let mut new_leader = None;
    for _ in 0..60 {
        cluster.tick_all_and_drain();
        if let Some(id) = others.iter().copied().find(|id| cluster.nodes[id].is_leader()) {
            new_leader = Some(id);
            break;
        }
    }
    let new_leader = new_leader.expect("the connected majority must elect a new leader");
    let replacement_index = cluster.propose(new_leader, vec![0xBBu8]).expect("new leader accepts proposal");
    assert!(replacement_index > stranded_index, "the new leader's own blank entry already claimed the stranded index");
    for _ in 0..20 {
        cluster.tick_all_and_drain();
    }

    // Healing the partition: the stale leader's conflicting suffix is
    // rolled back and overwritten by the new leader's entries.
    cluster.heal(old_leader);
    for _ in 0..30 {
        cluster.tick_all_and_drain();
    }

    assert_eq!(cluster.leaders(), vec![new_leader], "exactly one leader once the partition heals");
    let ids: Vec<u64> = cluster.nodes.keys().copied().collect();
    for id in &ids {
        let fsm = cluster.nodes[id].debug_fsm();
        assert!(
            fsm.get(stranded_index).is_none() || fsm.get(stranded_index).unwrap().as_ref() != &[0xAAu8][..],
            "node {} must never apply the stranded leader's discarded payload",
            id
        );
    }
    for id in &ids {
        let fsm = cluster.nodes[id].debug_fsm();
        let applied = fsm.get(replacement_index).unwrap_or_else(|| panic!("node {} missing the replacement entry", id));
        assert_eq!(applied.as_ref(), &[0xBBu8][..], "node {} must hold the new leader's committed entry", id);
    }
}
