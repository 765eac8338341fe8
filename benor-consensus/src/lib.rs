pub mod cluster;
pub mod config;
pub mod consensus;
pub mod node;

pub use cluster::LocalCluster;
pub use config::ProtocolConfig;
pub use consensus::majority::resolve;
pub use consensus::store::RoundMessageStore;
pub use consensus::tiebreak::{CoinTieBreak, ParityTieBreak, SelectedTieBreak, TieBreak};
pub use consensus::waiter::{BoundedWaiter, WaitOutcome};
pub use node::ConsensusNode;
