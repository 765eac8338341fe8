use std::time::Duration;

use async_trait::async_trait;

use benor_common::{Message, NodeId};

use crate::error::NetworkError;
use crate::peers::PeerBook;
use crate::ports::Transport;

const SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Delivers messages by POSTing their JSON form to `/message` of each peer.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    peers: PeerBook,
}

impl HttpTransport {
    pub fn new(peers: PeerBook) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| NetworkError::Http(e.to_string()))?;
        Ok(Self { client, peers })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn peer_count(&self) -> usize {
        self.peers.len()
    }

    async fn send_to(&self, peer: NodeId, message: Message) -> Result<(), NetworkError> {
        let url = self
            .peers
            .message_url(peer)
            .ok_or_else(|| NetworkError::PeerNotFound(peer.to_string()))?;

        self.client
            .post(url)
            .json(&message)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| NetworkError::Http(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benor_common::{Phase, Value};

    #[tokio::test]
    async fn test_unknown_peer() {
        let transport = HttpTransport::new(PeerBook::contiguous("127.0.0.1", 3000, 2).unwrap()).unwrap();
        let msg = Message::new(Phase::R, NodeId(0), 1, Value::Zero);
        assert!(matches!(
            transport.send_to(NodeId(9), msg).await,
            Err(NetworkError::PeerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_an_error() {
        // Port 1 on loopback is not expected to be listening.
        let transport = HttpTransport::new(PeerBook::from_ports("127.0.0.1", &[1])).unwrap();
        let msg = Message::new(Phase::R, NodeId(0), 1, Value::Zero);
        assert!(matches!(
            transport.send_to(NodeId(0), msg).await,
            Err(NetworkError::Http(_))
        ));
    }
}
