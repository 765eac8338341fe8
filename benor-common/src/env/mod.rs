pub mod message;
pub mod params;
pub mod state;
