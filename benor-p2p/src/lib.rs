pub mod error;
pub mod fanout;
pub mod http;
pub mod in_memory;
pub mod peers;
pub mod ports;

pub use error::NetworkError;
pub use fanout::FanOut;
pub use http::HttpTransport;
pub use in_memory::InMemoryNetwork;
pub use peers::PeerBook;
pub use ports::{Broadcaster, MessageSink, Transport};
