use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use benor_common::{BenOrError, NodeId, Result};
use benor_consensus::ConsensusNode;
use benor_p2p::{FanOut, HttpTransport, PeerBook};

use crate::api::rest;
use crate::config::NetworkConfig;

/// A node whose broadcasts travel over HTTP.
pub type HttpNode = ConsensusNode<FanOut<HttpTransport>>;

/// A running network: every node is listening and idle until started.
pub struct LaunchedNetwork {
    nodes: Vec<Arc<HttpNode>>,
    peers: PeerBook,
    servers: Vec<JoinHandle<()>>,
}

impl LaunchedNetwork {
    pub fn nodes(&self) -> &[Arc<HttpNode>] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Arc<HttpNode>> {
        self.nodes.get(id.index())
    }

    /// The addresses actually bound, which differ from the configured ones
    /// when ephemeral ports were requested.
    pub fn peers(&self) -> &PeerBook {
        &self.peers
    }

    /// Kills every node and tears down the HTTP servers.
    pub fn shutdown(&self) {
        for node in &self.nodes {
            node.stop();
        }
        for server in &self.servers {
            server.abort();
        }
    }
}

impl Drop for LaunchedNetwork {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .map_err(|e| BenOrError::Network(format!("cannot bind {}:{}: {}", host, port, e)))
}

fn build_node(config: &NetworkConfig, id: NodeId, peers: PeerBook) -> Result<Arc<HttpNode>> {
    let transport = HttpTransport::new(peers).map_err(|e| BenOrError::Network(e.to_string()))?;
    Ok(Arc::new(ConsensusNode::new(
        id,
        config.params(),
        config.protocol.clone(),
        config.initial_value(id)?,
        config.is_faulty(id),
        FanOut::new(transport),
    )))
}

fn spawn_server(listener: TcpListener, node: Arc<HttpNode>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let id = node.id();
        if let Err(e) = rest::serve(listener, node).await {
            error!("❌ server of {} stopped: {}", id, e);
        }
    })
}

/// Builds and serves all N nodes in this process.
///
/// Every listener is bound before any server task is spawned, so when this
/// returns each node already accepts connections.
pub async fn launch_network(config: &NetworkConfig) -> Result<LaunchedNetwork> {
    config.validate()?;

    let mut listeners = Vec::with_capacity(config.n);
    for i in 0..config.n {
        let port = if config.base_port == 0 {
            0
        } else {
            config.port(NodeId(i))?
        };
        listeners.push(bind(&config.host, port).await?);
    }

    let ports = listeners
        .iter()
        .map(|listener| listener.local_addr().map(|addr| addr.port()))
        .collect::<std::io::Result<Vec<u16>>>()?;
    let peers = PeerBook::from_ports(&config.host, &ports);

    let mut nodes = Vec::with_capacity(config.n);
    let mut servers = Vec::with_capacity(config.n);
    for (i, listener) in listeners.into_iter().enumerate() {
        let node = build_node(config, NodeId(i), peers.clone())?;
        servers.push(spawn_server(listener, Arc::clone(&node)));
        nodes.push(node);
    }

    info!(
        "🚀 all {} nodes ready (f={}, faulty={:?})",
        config.n, config.f, config.faulty
    );
    tracing::info!(target: "consensus", "EVENT:READY n={} f={}", config.n, config.f);

    Ok(LaunchedNetwork {
        nodes,
        peers,
        servers,
    })
}

/// Serves a single node of a multi-process network on `base_port + id`.
pub async fn launch_node(
    config: &NetworkConfig,
    id: NodeId,
) -> Result<(Arc<HttpNode>, JoinHandle<()>)> {
    config.validate()?;
    let peers = config.peer_book()?;
    let listener = bind(&config.host, config.port(id)?).await?;

    let node = build_node(config, id, peers)?;
    let server = spawn_server(listener, Arc::clone(&node));
    Ok((node, server))
}
