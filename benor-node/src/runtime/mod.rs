pub mod launcher;
pub mod orchestrator;
