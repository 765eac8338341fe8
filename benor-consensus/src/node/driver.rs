use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use benor_common::{Message, NodeId, NodeState, Phase, ProtocolParams, Value};
use benor_p2p::Broadcaster;

use crate::config::ProtocolConfig;
use crate::consensus::majority::resolve;
use crate::consensus::store::RoundMessageStore;
use crate::consensus::tiebreak::TieBreak;
use crate::consensus::waiter::{BoundedWaiter, WaitOutcome};

use super::state::StateHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundEnd {
    Continue,
    Decided,
    Killed,
    /// Nothing to drive: the state holds the null sentinel.
    Idle,
}

/// The protocol state machine of one node. Runs as a single task and is the
/// only writer of the node's value, decision and round.
pub(super) struct RoundDriver<B, T> {
    pub(super) id: NodeId,
    pub(super) params: ProtocolParams,
    pub(super) config: ProtocolConfig,
    pub(super) state: Arc<StateHandle>,
    pub(super) store: Arc<RoundMessageStore>,
    pub(super) broadcaster: Arc<B>,
    pub(super) waiter: BoundedWaiter,
    pub(super) tie_break: T,
}

impl<B: Broadcaster, T: TieBreak> RoundDriver<B, T> {
    pub(super) async fn run(self) {
        let mut observer = self.state.subscribe();

        loop {
            match self.play_round(&mut observer).await {
                RoundEnd::Continue => tokio::time::sleep(self.config.round_pause()).await,
                RoundEnd::Decided => {
                    self.farewell().await;
                    break;
                }
                RoundEnd::Killed | RoundEnd::Idle => break,
            }
        }

        debug!("driver of {} stopped", self.id);
    }

    async fn play_round(&self, observer: &mut watch::Receiver<NodeState>) -> RoundEnd {
        let snapshot = self.state.snapshot();
        if snapshot.killed {
            return RoundEnd::Killed;
        }
        if snapshot.is_decided() {
            return RoundEnd::Decided;
        }
        let (Some(value), Some(round)) = (snapshot.value, snapshot.round) else {
            return RoundEnd::Idle;
        };
        let threshold = self.params.majority_threshold();

        // Phase R: raw proposals.
        if !self.broadcast(Phase::R, round, value).await {
            return RoundEnd::Killed;
        }
        if self.collect(round, Phase::R, observer).await == WaitOutcome::Killed {
            return RoundEnd::Killed;
        }
        let r_values = self.store.values(round, Phase::R);
        let proposal = match resolve(&r_values, threshold) {
            Some(majority) => majority,
            None => {
                let coin = self.tie_break.choose(round);
                debug!("{} round {}: no R majority in {:?}, tie-break -> {}", self.id, round, r_values, coin);
                coin
            }
        };

        // Phase P: tie-broken proposals.
        if !self.broadcast(Phase::P, round, proposal).await {
            return RoundEnd::Killed;
        }
        if self.collect(round, Phase::P, observer).await == WaitOutcome::Killed {
            return RoundEnd::Killed;
        }
        let p_values = self.store.values(round, Phase::P);
        let p_majority = resolve(&p_values, threshold);

        let end = self.conclude(round, value, proposal, p_majority, &p_values);
        self.store.evict(round);
        end
    }

    /// Announces the decided value for both phases of the next round, so peers
    /// still running that round can reach their quorum and majority. The
    /// state is not touched.
    async fn farewell(&self) {
        let snapshot = self.state.snapshot();
        if let (Some(value), Some(round)) = (snapshot.value, snapshot.round) {
            if self.broadcast(Phase::R, round, value).await {
                self.broadcast(Phase::P, round, value).await;
            }
        }
    }

    /// Broadcasts unless killed. Returns `false` when nothing was sent.
    async fn broadcast(&self, phase: Phase, round: u64, value: Value) -> bool {
        if self.state.is_killed() {
            return false;
        }
        self.broadcaster
            .broadcast(Message::new(phase, self.id, round, value))
            .await;
        true
    }

    async fn collect(
        &self,
        round: u64,
        phase: Phase,
        observer: &mut watch::Receiver<NodeState>,
    ) -> WaitOutcome {
        let outcome = self
            .waiter
            .wait_for(&self.store, round, phase, self.params.quorum(), observer)
            .await;
        if outcome == WaitOutcome::TimedOut {
            debug!(
                "{} round {}: phase {} timed out with {}/{} messages",
                self.id,
                round,
                phase,
                self.store.count(round, phase),
                self.params.quorum()
            );
        }
        outcome
    }

    /// Applies the decision rule for `round` and advances to the next one.
    fn conclude(
        &self,
        round: u64,
        current: Value,
        proposal: Value,
        p_majority: Option<Value>,
        p_values: &[Value],
    ) -> RoundEnd {
        let (next_value, decided, forced) = if self.params.within_tolerance() {
            match p_majority {
                Some(majority) => (majority, true, false),
                None => {
                    let forced = self
                        .config
                        .force_decide_round
                        .is_some_and(|limit| round >= limit);
                    (proposal, forced, forced)
                }
            }
        } else {
            // Too many faults for safety: never decide, just mirror what was seen.
            (p_values.first().copied().unwrap_or(current), false, false)
        };

        let applied = self.state.update(|state| {
            state.value = Some(next_value);
            if decided {
                state.decided = Some(true);
            }
            state.round = Some(round + 1);
        });
        if !applied {
            return RoundEnd::Killed;
        }

        if decided {
            info!("✅ {} decided {} in round {}{}", self.id, next_value, round, if forced { " (forced)" } else { "" });
            tracing::info!(
                target: "consensus",
                "EVENT:DECIDE node={} round={} value={} forced={}",
                self.id, round, next_value, forced
            );
            RoundEnd::Decided
        } else {
            debug!("{} round {} done, carrying {}", self.id, round, next_value);
            RoundEnd::Continue
        }
    }
}
