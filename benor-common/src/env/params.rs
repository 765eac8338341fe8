use serde::{Deserialize, Serialize};

/// Network size and configured fault count, plus the thresholds derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    pub n: usize,
    pub f: usize,
}

impl ProtocolParams {
    pub fn new(n: usize, f: usize) -> Self {
        Self { n, f }
    }

    /// N - F: messages to wait for per phase.
    pub fn quorum(&self) -> usize {
        self.n.saturating_sub(self.f)
    }

    /// floor(N/2) + 1: votes needed for a strict majority.
    pub fn majority_threshold(&self) -> usize {
        self.n / 2 + 1
    }

    /// floor((N-1)/2): largest F under which agreement and validity hold.
    pub fn tolerance(&self) -> usize {
        self.n.saturating_sub(1) / 2
    }

    pub fn within_tolerance(&self) -> bool {
        self.f <= self.tolerance()
    }
}
