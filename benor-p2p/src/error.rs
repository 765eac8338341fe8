use thiserror::Error;

/// Failure of a single point-to-point send.
///
/// These never leave the broadcaster: `FanOut` logs and drops them, the quorum
/// rule tolerates the missing deliveries.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Failed to send message to peer {0}")]
    SendError(String),

    #[error("Peer {0} not found")]
    PeerNotFound(String),

    #[error("Peer {0} is disconnected")]
    Disconnected(String),

    #[error("HTTP error: {0}")]
    Http(String),
}
