pub mod env;
pub mod error;
pub mod utils;

pub use env::message::{Message, Phase, Value};
pub use env::params::ProtocolParams;
pub use env::state::NodeState;
pub use error::{BenOrError, Result};
pub use utils::NodeId;
