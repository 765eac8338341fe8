use std::time::Duration;

use futures::future::try_join_all;
use tokio::time::Instant;
use tracing::{debug, info};

use benor_common::{BenOrError, NodeId, NodeState, Result};
use benor_p2p::PeerBook;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

fn http_error(e: reqwest::Error) -> BenOrError {
    BenOrError::Network(e.to_string())
}

/// Drives a network from the outside, over each node's HTTP surface.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    client: reqwest::Client,
    peers: PeerBook,
}

impl Orchestrator {
    pub fn new(peers: PeerBook) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(http_error)?;
        Ok(Self { client, peers })
    }

    fn url(&self, id: NodeId, path: &str) -> Result<String> {
        self.peers
            .url(id, path)
            .ok_or_else(|| BenOrError::Config(format!("no address for {}", id)))
    }

    async fn get_text(&self, id: NodeId, path: &str) -> Result<String> {
        self.client
            .get(self.url(id, path)?)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(http_error)?
            .text()
            .await
            .map_err(http_error)
    }

    pub async fn start_consensus(&self) -> Result<()> {
        try_join_all(self.peers.ids().map(|id| self.get_text(id, "start"))).await?;
        info!("▶️ consensus started on {} nodes", self.peers.len());
        Ok(())
    }

    pub async fn stop_consensus(&self) -> Result<()> {
        try_join_all(self.peers.ids().map(|id| self.get_text(id, "stop"))).await?;
        info!("⏹️ consensus stopped on {} nodes", self.peers.len());
        Ok(())
    }

    /// `true` for live nodes; faulty nodes answer 500 and report `false`.
    pub async fn statuses(&self) -> Result<Vec<bool>> {
        try_join_all(self.peers.ids().map(|id| async move {
            let res = self
                .client
                .get(self.url(id, "status")?)
                .send()
                .await
                .map_err(http_error)?;
            Ok::<bool, BenOrError>(res.status().is_success())
        }))
        .await
    }

    pub async fn collect_states(&self) -> Result<Vec<NodeState>> {
        try_join_all(self.peers.ids().map(|id| async move {
            self.client
                .get(self.url(id, "getState")?)
                .send()
                .await
                .and_then(|res| res.error_for_status())
                .map_err(http_error)?
                .json::<NodeState>()
                .await
                .map_err(http_error)
        }))
        .await
    }

    /// Polls the states until every node outside `faulty` has decided.
    /// Returns the last states seen and whether they are all decided.
    pub async fn wait_for_decision(
        &self,
        faulty: &[usize],
        timeout: Duration,
        poll: Duration,
    ) -> Result<(bool, Vec<NodeState>)> {
        let deadline = Instant::now() + timeout;
        loop {
            let states = self.collect_states().await?;
            let done = states
                .iter()
                .enumerate()
                .filter(|(i, _)| !faulty.contains(i))
                .all(|(_, state)| state.is_decided());
            if done {
                return Ok((true, states));
            }
            if Instant::now() >= deadline {
                debug!("no decision before the deadline: {:?}", states);
                return Ok((false, states));
            }
            tokio::time::sleep(poll).await;
        }
    }
}
