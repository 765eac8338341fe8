use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing::{debug, info};

use benor_common::{Message, NodeState, Result};
use benor_consensus::{ConsensusNode, TieBreak};
use benor_p2p::Broadcaster;

type NodeHandle<B, T> = Arc<ConsensusNode<B, T>>;

/// The per-node lifecycle and delivery surface.
pub fn router<B, T>(node: NodeHandle<B, T>) -> Router
where
    B: Broadcaster + 'static,
    T: TieBreak,
{
    Router::new()
        .route("/message", post(receive_message::<B, T>))
        .route("/start", get(start::<B, T>))
        .route("/stop", get(stop::<B, T>))
        .route("/status", get(status::<B, T>))
        .route("/getState", get(get_state::<B, T>))
        .with_state(node)
}

/// Serves `node` on an already bound listener until the server fails.
pub async fn serve<B, T>(listener: TcpListener, node: NodeHandle<B, T>) -> Result<()>
where
    B: Broadcaster + 'static,
    T: TieBreak,
{
    if let Ok(addr) = listener.local_addr() {
        info!("🌐 {} listening on {}", node.id(), addr);
    }
    axum::serve(listener, router(node)).await?;
    Ok(())
}

async fn receive_message<B, T>(
    State(node): State<NodeHandle<B, T>>,
    Json(message): Json<Message>,
) -> &'static str
where
    B: Broadcaster + 'static,
    T: TieBreak,
{
    if !node.receive(message) {
        debug!("{} acknowledged but dropped {:?}", node.id(), message);
    }
    "message received"
}

async fn start<B, T>(State(node): State<NodeHandle<B, T>>) -> &'static str
where
    B: Broadcaster + 'static,
    T: TieBreak,
{
    node.start();
    "started"
}

async fn stop<B, T>(State(node): State<NodeHandle<B, T>>) -> &'static str
where
    B: Broadcaster + 'static,
    T: TieBreak,
{
    node.stop();
    "killed"
}

async fn status<B, T>(State(node): State<NodeHandle<B, T>>) -> (StatusCode, &'static str)
where
    B: Broadcaster + 'static,
    T: TieBreak,
{
    if node.is_live() {
        (StatusCode::OK, "live")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "faulty")
    }
}

async fn get_state<B, T>(State(node): State<NodeHandle<B, T>>) -> Json<NodeState>
where
    B: Broadcaster + 'static,
    T: TieBreak,
{
    Json(node.get_state())
}
