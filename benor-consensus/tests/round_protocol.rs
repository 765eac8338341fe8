use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use benor_common::{Message, NodeId, NodeState, Phase, ProtocolParams, Value};
use benor_consensus::{CoinTieBreak, ConsensusNode, LocalCluster, ParityTieBreak, ProtocolConfig};
use benor_p2p::Broadcaster;

const ZERO: Value = Value::Zero;
const ONE: Value = Value::One;

fn fast_config() -> ProtocolConfig {
    ProtocolConfig {
        poll_interval_ms: 2,
        quorum_timeout_ms: 200,
        round_pause_ms: 1,
        force_decide_round: Some(10),
    }
}

fn spawn(
    n: usize,
    f: usize,
    values: &[Value],
    faulty: &[bool],
    config: ProtocolConfig,
) -> LocalCluster<ParityTieBreak> {
    LocalCluster::spawn(ProtocolParams::new(n, f), config, values, faulty)
        .expect("cluster should build")
}

fn decided_values(states: &[NodeState]) -> Vec<Value> {
    states
        .iter()
        .filter(|s| s.is_decided())
        .filter_map(|s| s.value)
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_split_start_four_nodes_agree() {
    let cluster = spawn(4, 1, &[ZERO, ZERO, ONE, ONE], &[false; 4], fast_config());
    assert_eq!(cluster.start_all(), 4);

    assert!(cluster.wait_until_decided(Duration::from_secs(5)).await);

    let values = decided_values(&cluster.states());
    assert_eq!(values.len(), 4);
    assert!(values.iter().all(|v| *v == values[0]), "disagreement: {values:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unanimous_start_decides_that_value() {
    let cluster = spawn(5, 2, &[ONE; 5], &[false; 5], fast_config());
    cluster.start_all();

    assert!(cluster.wait_until_decided(Duration::from_secs(5)).await);
    assert_eq!(decided_values(&cluster.states()), vec![ONE; 5]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_round_one_tie_break_sides_with_the_ones() {
    // Any 3-of-5 view is either [1,1,1] or tied; the round 1 tie-break is 1 too.
    let cluster = spawn(5, 2, &[ZERO, ZERO, ONE, ONE, ONE], &[false; 5], fast_config());
    cluster.start_all();

    assert!(cluster.wait_until_decided(Duration::from_secs(5)).await);
    assert_eq!(decided_values(&cluster.states()), vec![ONE; 5]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_faulty_node_keeps_the_sentinel() {
    let cluster = spawn(
        4,
        1,
        &[ONE, ONE, ONE, ZERO],
        &[false, false, false, true],
        fast_config(),
    );
    assert_eq!(cluster.start_all(), 3);

    let faulty = cluster.node(NodeId(3)).unwrap();
    assert!(!faulty.is_live());
    assert!(faulty.get_state().is_sentinel());

    assert!(cluster.wait_until_decided(Duration::from_secs(5)).await);

    let states = cluster.states();
    assert_eq!(decided_values(&states[..3]), vec![ONE; 3]);
    assert!(states[3].is_sentinel());
    assert!(!faulty.is_live());
    assert!(!faulty.start());

    faulty.stop();
    let state = faulty.get_state();
    assert!(state.killed);
    assert!(state.is_sentinel());
    assert!(!faulty.is_live());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_too_many_faults_never_decide() {
    let cluster = spawn(3, 2, &[ZERO, ONE, ONE], &[false; 3], fast_config());
    cluster.start_all();

    let past_forced_round = cluster
        .wait_for(Duration::from_secs(10), |states| {
            states.iter().all(|s| s.round.unwrap_or(0) >= 15)
        })
        .await;
    assert!(past_forced_round);

    for state in cluster.states() {
        assert_eq!(state.decided, Some(false));
        assert!(state.value.is_some());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_too_many_faults_with_faulty_peers() {
    let cluster = spawn(3, 2, &[ONE, ZERO, ZERO], &[false, true, true], fast_config());
    assert_eq!(cluster.start_all(), 1);

    assert!(
        cluster
            .wait_for(Duration::from_secs(10), |states| states[0].round.unwrap_or(0) >= 15)
            .await
    );

    let states = cluster.states();
    assert_eq!(states[0].decided, Some(false));
    assert!(states[1].is_sentinel());
    assert!(states[2].is_sentinel());
}

fn lonely_pair(force_decide_round: Option<u64>) -> LocalCluster<ParityTieBreak> {
    // N=2, F=0: the quorum is both nodes, but the peer never talks.
    let config = ProtocolConfig {
        quorum_timeout_ms: 10,
        force_decide_round,
        ..fast_config()
    };
    spawn(2, 0, &[ONE, ONE], &[false, true], config)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_forced_decision_at_round_ten() {
    let cluster = lonely_pair(Some(10));
    cluster.start_all();

    assert!(cluster.wait_until_decided(Duration::from_secs(10)).await);

    let state = cluster.states()[0];
    assert!(state.is_decided());
    assert_eq!(state.round, Some(11));
    // Round 10 had no majority, so the parity tie-break picked the value.
    assert_eq!(state.value, Some(ZERO));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_forced_decision_when_disabled() {
    let cluster = lonely_pair(None);
    cluster.start_all();

    assert!(
        cluster
            .wait_for(Duration::from_secs(10), |states| states[0].round.unwrap_or(0) >= 13)
            .await
    );
    assert_eq!(cluster.states()[0].decided, Some(false));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_decided_node_drops_inbound_messages() {
    let cluster = spawn(3, 1, &[ZERO; 3], &[false; 3], fast_config());
    cluster.start_all();
    assert!(cluster.wait_until_decided(Duration::from_secs(5)).await);

    let node = cluster.node(NodeId(0)).unwrap();
    let late = Message::new(Phase::R, NodeId(1), 40, ONE);
    assert!(!node.receive(late));
    assert_eq!(node.store().count(40, Phase::R), 0);
}

#[derive(Default)]
struct CountingBroadcaster {
    sent: AtomicUsize,
}

#[async_trait]
impl Broadcaster for CountingBroadcaster {
    async fn broadcast(&self, _message: Message) {
        self.sent.fetch_add(1, Ordering::SeqCst);
    }
}

fn isolated_node(
    broadcaster: Arc<CountingBroadcaster>,
) -> ConsensusNode<Arc<CountingBroadcaster>, ParityTieBreak> {
    // F > T: the node never decides and keeps advancing on timeouts.
    let config = ProtocolConfig {
        quorum_timeout_ms: 5,
        ..fast_config()
    };
    ConsensusNode::new(
        NodeId(0),
        ProtocolParams::new(3, 2),
        config,
        ONE,
        false,
        broadcaster,
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_kill_freezes_state_and_silences_broadcasts() {
    let broadcaster = Arc::new(CountingBroadcaster::default());
    let node = isolated_node(Arc::clone(&broadcaster));
    assert_eq!(node.params().quorum(), 1);

    assert!(node.start());
    assert!(!node.start(), "second start must be a no-op");

    let mut observer = node.subscribe();
    observer
        .wait_for(|s| s.round.unwrap_or(0) >= 3)
        .await
        .expect("driver should advance");

    node.stop();
    node.join().await;

    let frozen = node.get_state();
    let sent = broadcaster.sent.load(Ordering::SeqCst);
    assert!(frozen.killed);

    node.stop();
    assert!(!node.start());
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(node.get_state(), frozen);
    assert_eq!(broadcaster.sent.load(Ordering::SeqCst), sent);
    assert!(node.is_live());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_driver_evicts_finished_rounds() {
    let node = isolated_node(Arc::new(CountingBroadcaster::default()));

    // A peer that is far ahead: both phases of many rounds are already buffered.
    for round in 1..=500 {
        assert!(node.receive(Message::new(Phase::R, NodeId(1), round, ONE)));
        assert!(node.receive(Message::new(Phase::P, NodeId(1), round, ONE)));
    }

    assert!(node.start());
    let mut observer = node.subscribe();
    observer
        .wait_for(|s| s.round.unwrap_or(0) >= 3)
        .await
        .expect("driver should advance");
    node.stop();
    node.join().await;

    let current = node.get_state().round.expect("participating node has a round");
    assert!(current >= 3);

    let buffered = node.store().buffered_rounds();
    assert!(!buffered.is_empty());
    assert!(
        buffered.iter().all(|round| *round >= current),
        "round {current} still holds finished rounds: {buffered:?}"
    );

    // A late message for a finished round cannot rebuild it.
    assert!(!node.store().append(Message::new(Phase::R, NodeId(2), current - 1, ZERO)));
    assert_eq!(node.store().count(current - 1, Phase::R), 0);
}

#[tokio::test]
async fn test_kill_before_start() {
    let node = isolated_node(Arc::new(CountingBroadcaster::default()));
    node.stop();

    assert!(!node.start());
    let state = node.get_state();
    assert!(state.killed);
    assert_eq!(state.round, Some(1));
    assert_eq!(state.value, Some(ONE));
    assert!(!node.receive(Message::new(Phase::R, NodeId(1), 1, ZERO)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_lost_peer_does_not_block_the_quorum() {
    let cluster = spawn(4, 1, &[ONE; 4], &[false; 4], fast_config());
    // Node 3 still sends, but nothing reaches it.
    cluster.network().disconnect(NodeId(3));
    assert_eq!(cluster.start_all(), cluster.nodes().len());

    let healthy_decided = cluster
        .wait_for(Duration::from_secs(5), |states| {
            states[..3].iter().all(|s| s.is_decided())
        })
        .await;
    assert!(healthy_decided);

    let states = cluster.states();
    assert_eq!(decided_values(&states[..3]), vec![ONE; 3]);
    // Cut off, node 3 only times out and is far from the forced round.
    assert_eq!(states[3].decided, Some(false));
}

fn spawn_coin(n: usize, f: usize, values: &[Value]) -> LocalCluster<CoinTieBreak> {
    LocalCluster::spawn(ProtocolParams::new(n, f), fast_config(), values, &vec![false; n])
        .expect("cluster should build")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_coin_build_unanimous_start_decides_that_value() {
    let cluster = spawn_coin(5, 2, &[ZERO; 5]);
    cluster.start_all();

    assert!(cluster.wait_until_decided(Duration::from_secs(5)).await);
    let states = cluster.states();
    assert_eq!(decided_values(&states), vec![ZERO; 5]);
    // A unanimous phase R never reaches the coin: everyone decides in round 1.
    assert!(states.iter().all(|s| s.round == Some(2)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_coin_build_split_start_terminates() {
    let cluster = spawn_coin(4, 1, &[ZERO, ZERO, ONE, ONE]);
    assert_eq!(cluster.start_all(), 4);

    // Nodes that decide early stop, so the rest may only finish at the forced round.
    assert!(cluster.wait_until_decided(Duration::from_secs(20)).await);

    for state in cluster.states() {
        assert!(state.is_decided());
        assert!(state.value.is_some());
        assert!(state.round.is_some_and(|k| (2..=11).contains(&k)), "{state:?}");
    }
}
