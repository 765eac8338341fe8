//! utils.rs
//!
//! Small shared helpers. Node identity lives here so every crate agrees on it.

pub mod node_id;
pub use node_id::NodeId;
