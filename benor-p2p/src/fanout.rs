use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;

use benor_common::{Message, NodeId};

use crate::ports::{Broadcaster, Transport};

/// `Broadcaster` over any `Transport`: one independent send per peer, issued
/// concurrently, failures discarded.
#[derive(Debug, Clone)]
pub struct FanOut<T: Transport> {
    transport: T,
}

impl<T: Transport> FanOut<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: Transport> Broadcaster for FanOut<T> {
    async fn broadcast(&self, message: Message) {
        let sends = (0..self.transport.peer_count()).map(|peer| {
            let peer = NodeId(peer);
            async move { (peer, self.transport.send_to(peer, message).await) }
        });

        for (peer, result) in join_all(sends).await {
            if let Err(e) = result {
                debug!(
                    "delivery of {} round {} from {} to {} dropped: {}",
                    message.phase, message.round, message.sender_id, peer, e
                );
            }
        }
    }
}
