use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::mpsc::{self, Sender};
use tracing::debug;

use benor_common::{Message, NodeId};

use crate::error::NetworkError;
use crate::ports::{MessageSink, Transport};

const INBOX_CAPACITY: usize = 1024;

/// In-process transport: every attached peer gets an mpsc inbox pumped into
/// its `MessageSink` by a dedicated task, so deliveries interleave the same
/// way they would over a real network.
///
/// Cloning shares the same peer table.
#[derive(Clone)]
pub struct InMemoryNetwork {
    peers: Arc<RwLock<Vec<Option<Sender<Message>>>>>,
    disconnected: Arc<RwLock<HashSet<NodeId>>>,
}

impl InMemoryNetwork {
    /// Creates a network with `n` empty peer slots.
    pub fn new(n: usize) -> Self {
        Self {
            peers: Arc::new(RwLock::new(vec![None; n])),
            disconnected: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Plugs `sink` in as peer `id` and spawns its inbox pump.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn attach(&self, id: NodeId, sink: Arc<dyn MessageSink>) {
        let (tx, mut rx) = mpsc::channel::<Message>(INBOX_CAPACITY);

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                sink.deliver(message);
            }
            debug!("inbox of {} closed", id);
        });

        let mut peers = self.peers.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = peers.get_mut(id.index()) {
            *slot = Some(tx);
        }
    }

    /// Drops every message addressed to `id` until `reconnect` is called.
    pub fn disconnect(&self, id: NodeId) {
        self.disconnected
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
    }

    pub fn reconnect(&self, id: NodeId) {
        self.disconnected
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    /// Closes every inbox; pump tasks exit once drained.
    pub fn close(&self) {
        let mut peers = self.peers.write().unwrap_or_else(PoisonError::into_inner);
        for slot in peers.iter_mut() {
            *slot = None;
        }
    }

    fn is_disconnected(&self, id: NodeId) -> bool {
        self.disconnected
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }
}

#[async_trait]
impl Transport for InMemoryNetwork {
    fn peer_count(&self) -> usize {
        self.peers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    async fn send_to(&self, peer: NodeId, message: Message) -> Result<(), NetworkError> {
        if self.is_disconnected(peer) {
            return Err(NetworkError::Disconnected(peer.to_string()));
        }

        let sender = {
            let peers = self.peers.read().unwrap_or_else(PoisonError::into_inner);
            peers.get(peer.index()).cloned().flatten()
        };

        match sender {
            Some(sender) => sender
                .send(message)
                .await
                .map_err(|_| NetworkError::SendError(peer.to_string())),
            None => Err(NetworkError::PeerNotFound(peer.to_string())),
        }
    }
}
