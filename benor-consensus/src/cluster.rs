use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use benor_common::{BenOrError, NodeId, NodeState, ProtocolParams, Result, Value};
use benor_p2p::{FanOut, InMemoryNetwork};

use crate::config::ProtocolConfig;
use crate::consensus::tiebreak::{SelectedTieBreak, TieBreak};
use crate::node::ConsensusNode;

pub type InMemoryNode<T = SelectedTieBreak> = ConsensusNode<FanOut<InMemoryNetwork>, T>;

const OBSERVE_INTERVAL: Duration = Duration::from_millis(5);

/// A whole network of nodes wired through one `InMemoryNetwork`, inside the
/// current process. Used for simulations and multi-node tests.
pub struct LocalCluster<T: TieBreak = SelectedTieBreak> {
    network: InMemoryNetwork,
    nodes: Vec<Arc<InMemoryNode<T>>>,
}

impl<T: TieBreak> LocalCluster<T> {
    /// Builds and wires N idle nodes. Must be called inside a tokio runtime.
    pub fn spawn(
        params: ProtocolParams,
        config: ProtocolConfig,
        initial_values: &[Value],
        faulty: &[bool],
    ) -> Result<Self> {
        if initial_values.len() != params.n || faulty.len() != params.n {
            return Err(BenOrError::Config(format!(
                "expected {} initial values and faulty flags, got {} and {}",
                params.n,
                initial_values.len(),
                faulty.len()
            )));
        }

        let network = InMemoryNetwork::new(params.n);
        let nodes: Vec<Arc<InMemoryNode<T>>> = initial_values
            .iter()
            .zip(faulty)
            .enumerate()
            .map(|(i, (value, is_faulty))| {
                Arc::new(ConsensusNode::new(
                    NodeId(i),
                    params,
                    config.clone(),
                    *value,
                    *is_faulty,
                    FanOut::new(network.clone()),
                ))
            })
            .collect();

        for node in &nodes {
            network.attach(node.id(), node.clone());
        }

        info!("🧪 local cluster ready: n={} f={}", params.n, params.f);
        Ok(Self { network, nodes })
    }

    pub fn nodes(&self) -> &[Arc<InMemoryNode<T>>] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Arc<InMemoryNode<T>>> {
        self.nodes.get(id.index())
    }

    pub fn network(&self) -> &InMemoryNetwork {
        &self.network
    }

    /// Returns how many drivers were actually started.
    pub fn start_all(&self) -> usize {
        self.nodes.iter().filter(|node| node.start()).count()
    }

    pub fn stop_all(&self) {
        for node in &self.nodes {
            node.stop();
        }
    }

    pub fn states(&self) -> Vec<NodeState> {
        self.nodes.iter().map(|node| node.get_state()).collect()
    }

    /// Polls the states until `done` holds or `timeout` passes.
    pub async fn wait_for(&self, timeout: Duration, done: impl Fn(&[NodeState]) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if done(&self.states()) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(OBSERVE_INTERVAL).await;
        }
    }

    /// Waits until every non-faulty node has decided.
    pub async fn wait_until_decided(&self, timeout: Duration) -> bool {
        let healthy: Vec<bool> = self.nodes.iter().map(|node| !node.is_faulty()).collect();
        self.wait_for(timeout, |states| {
            states
                .iter()
                .zip(&healthy)
                .filter(|(_, healthy)| **healthy)
                .all(|(state, _)| state.is_decided())
        })
        .await
    }
}

impl<T: TieBreak> Drop for LocalCluster<T> {
    fn drop(&mut self) {
        self.stop_all();
        self.network.close();
    }
}
