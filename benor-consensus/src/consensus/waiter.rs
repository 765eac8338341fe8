use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant};

use benor_common::{NodeState, Phase};

use super::store::RoundMessageStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// At least the requested number of messages arrived.
    Quorum,
    /// The wait ran out; the caller continues with what it has.
    TimedOut,
    /// The node was killed while waiting.
    Killed,
}

impl WaitOutcome {
    pub fn reached_quorum(&self) -> bool {
        matches!(self, WaitOutcome::Quorum)
    }
}

/// Waits for a quorum of one phase of one round, bounded in time.
///
/// Wakes up on every store arrival and on every state change, with
/// `poll_interval` as a fallback tick.
#[derive(Debug, Clone, Copy)]
pub struct BoundedWaiter {
    poll_interval: Duration,
    max_wait: Duration,
}

impl BoundedWaiter {
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Self {
        Self { poll_interval, max_wait }
    }

    pub async fn wait_for(
        &self,
        store: &RoundMessageStore,
        round: u64,
        phase: Phase,
        min_count: usize,
        state: &mut watch::Receiver<NodeState>,
    ) -> WaitOutcome {
        let deadline = Instant::now() + self.max_wait;
        let mut arrivals = store.subscribe();

        loop {
            if state.borrow_and_update().killed {
                return WaitOutcome::Killed;
            }
            if store.count(round, phase) >= min_count {
                return WaitOutcome::Quorum;
            }
            if Instant::now() >= deadline {
                return WaitOutcome::TimedOut;
            }

            tokio::select! {
                Ok(()) = arrivals.changed() => {}
                Ok(()) = state.changed() => {}
                _ = time::sleep(self.poll_interval) => {}
                _ = time::sleep_until(deadline) => {}
            }
        }
    }
}
