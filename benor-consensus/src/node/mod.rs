mod core;
mod driver;
mod inbound;
mod lifecycle;
mod state;

pub use self::core::ConsensusNode;
