use thiserror::Error;

/// Errors surfaced by bootstrap, configuration and orchestration code.
///
/// The consensus core itself never fails: delivery failures are swallowed and
/// quorum timeouts are a normal branch. These variants only cover the outer
/// layers that build and drive nodes.
#[derive(Debug, Error)]
pub enum BenOrError {
    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BenOrError>;
