pub mod api;
pub mod cli;
pub mod config;
pub mod logging;
pub mod runtime;

pub use config::NetworkConfig;
pub use runtime::launcher::{launch_network, launch_node, HttpNode, LaunchedNetwork};
pub use runtime::orchestrator::Orchestrator;
