use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing knobs of the round driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Fallback tick of the quorum wait; also bounds how late a kill is noticed.
    pub poll_interval_ms: u64,
    /// Longest a phase waits for its N - F messages before moving on.
    pub quorum_timeout_ms: u64,
    /// Pause between two rounds.
    pub round_pause_ms: u64,
    /// Round from which an undecided node decides on its proposal anyway.
    ///
    /// This is a liveness patch outside Ben-Or's guarantees: it bounds
    /// termination at the price of agreement under adversarial schedules.
    /// `None` disables it.
    ///
    /// It is not the only way nodes can split. An undecided node carries its
    /// own proposal into the next round, and a P-majority seen by one node
    /// need not be seen by the others, so nodes can decide different values
    /// in different rounds. The coin tie-break makes this reachable on
    /// ordinary schedules; with parity every tie-breaking node at least picks
    /// the same value.
    pub force_decide_round: Option<u64>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            quorum_timeout_ms: 2_000,
            round_pause_ms: 5,
            force_decide_round: Some(10),
        }
    }
}

impl ProtocolConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn quorum_timeout(&self) -> Duration {
        Duration::from_millis(self.quorum_timeout_ms)
    }

    pub fn round_pause(&self) -> Duration {
        Duration::from_millis(self.round_pause_ms)
    }
}
