use std::sync::Arc;

use async_trait::async_trait;
use benor_common::{Message, NodeId};

use crate::error::NetworkError;

/// Best-effort fan-out of one message to every peer of the network.
///
/// Nothing is reported back: individual delivery failures are the transport's
/// business and the protocol only relies on receiving N - F responses.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, message: Message);
}

#[async_trait]
impl<B: Broadcaster + ?Sized> Broadcaster for Arc<B> {
    async fn broadcast(&self, message: Message) {
        (**self).broadcast(message).await
    }
}

/// Point-to-point delivery to one of the N known peers.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Number of addressable peers, the sender included.
    fn peer_count(&self) -> usize;

    async fn send_to(&self, peer: NodeId, message: Message) -> Result<(), NetworkError>;
}

/// Receiving end of the inbound delivery path.
///
/// Delivery is always acknowledged; whether the content is retained is up to
/// the sink.
pub trait MessageSink: Send + Sync {
    fn deliver(&self, message: Message);
}
