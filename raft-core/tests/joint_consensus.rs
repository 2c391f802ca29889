//! Literal scenario: a single-step membership change that both adds and
//! removes a voter goes through joint consensus ({1,2,3} -> {1,2,3}+{1,2,4}
//! joint -> {1,2,4} simple) and auto-leaves on its own once the joint
//! configuration commits.

mod support;

use std::collections::BTreeSet;

use raft_core::membership::ConfChangeSingle;
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
fn single_step_conf_change_reaches_simple_majority_via_joint_consensus() {
    let mut cluster = Cluster::new(&[1, 2, 3], test_config());
    assert!(cluster.elect(1, 20));
    let leader = cluster.leaders()[0];

    cluster.add_node(4, test_config());

    let index = cluster
        .reconfig(leader, vec![ConfChangeSingle::AddVoter(4), ConfChangeSingle::RemoveVoter(3)])
        .expect("leader accepts the conf change");

    // While the joint configuration is in effect, both the old voter half
    // ({1,2,3}) and the new one ({1,2,4}) must separately reach quorum, so
    // drive enough ticks for the new voter to catch up and ack.
    for _ in 0..60 {
        cluster.tick_all_and_drain();
    }

    let metrics = cluster.nodes[&leader].metrics();
    assert!(!metrics.membership_config.is_joint(), "the configuration should have auto-left the joint state");
    assert_eq!(metrics.membership_config.incoming, BTreeSet::from([1, 2, 4]));
    assert!(metrics.membership_config.outgoing.is_empty());
    assert!(metrics.last_applied >= index, "the conf-change entry itself must have committed and applied");

    // Node 4 was a plain follower throughout; it should have the same final
    // configuration once it has processed the whole log.
    let node4_conf = cluster.nodes[&4].metrics().membership_config;
    assert_eq!(node4_conf.incoming, BTreeSet::from([1, 2, 4]));
}

#[test]
fn a_second_conf_change_is_rejected_while_one_is_still_pending() {
    let mut cluster = Cluster::new(&[1, 2, 3], test_config());
    assert!(cluster.elect(1, 20));
    let leader = cluster.leaders()[0];

    cluster.add_node(4, test_config());
    cluster.add_node(5, test_config());

    cluster.reconfig(leader, vec![ConfChangeSingle::AddVoter(4)]).expect("first change is accepted");
    let err = cluster.reconfig(leader, vec![ConfChangeSingle::AddVoter(5)]).expect_err("a second change must be refused");
    assert!(matches!(err, raft_core::ConfChangeError::AlreadyInProgress));
}
