use std::sync::atomic::Ordering;
use std::sync::{Arc, PoisonError};

use tracing::{debug, info};

use benor_common::NodeState;
use benor_p2p::Broadcaster;

use crate::consensus::tiebreak::TieBreak;
use crate::consensus::waiter::BoundedWaiter;

use super::core::ConsensusNode;
use super::driver::RoundDriver;

impl<B: Broadcaster + 'static, T: TieBreak> ConsensusNode<B, T> {
    /// Begins participation by spawning the round driver.
    ///
    /// No-op (returns `false`) for a faulty node, a killed node, or a node
    /// whose driver was already started. Must be called inside a tokio runtime.
    pub fn start(&self) -> bool {
        if self.faulty {
            debug!("{} is faulty, start ignored", self.id);
            return false;
        }
        if self.state.is_killed() {
            debug!("{} is killed, start ignored", self.id);
            return false;
        }
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("{} already started", self.id);
            return false;
        }

        let driver = RoundDriver {
            id: self.id,
            params: self.params,
            config: self.config.clone(),
            state: Arc::clone(&self.state),
            store: Arc::clone(&self.store),
            broadcaster: Arc::clone(&self.broadcaster),
            waiter: BoundedWaiter::new(self.config.poll_interval(), self.config.quorum_timeout()),
            tie_break: T::default(),
        };

        info!(
            "▶️ {} starting (n={}, f={}, tie-break={})",
            self.id,
            self.params.n,
            self.params.f,
            T::NAME
        );
        tracing::info!(target: "consensus", "EVENT:START node={}", self.id);

        let handle = tokio::spawn(driver.run());
        *self.driver.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        true
    }

    /// Kills the node. Unconditional and idempotent; the driver halts within
    /// one polling interval and the state is frozen from here on.
    pub fn stop(&self) {
        if self.state.kill() {
            info!("⏹️ {} killed", self.id);
            tracing::info!(target: "consensus", "EVENT:KILL node={}", self.id);
        }
    }

    /// Liveness probe: faulty nodes are permanently non-live.
    pub fn is_live(&self) -> bool {
        !self.faulty
    }

    pub fn get_state(&self) -> NodeState {
        self.state.snapshot()
    }

    /// Waits for the driver task to finish, if one was started.
    pub async fn join(&self) {
        let handle = self
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                debug!("driver of {} ended abnormally: {}", self.id, e);
            }
        }
    }
}
