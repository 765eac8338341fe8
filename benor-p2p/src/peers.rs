use serde::{Deserialize, Serialize};

use benor_common::NodeId;

/// Static address book mapping a node index to its HTTP endpoint.
///
/// The usual layout is contiguous: node `i` listens on `host:base_port + i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerBook {
    endpoints: Vec<String>,
}

impl PeerBook {
    /// `None` if `base_port + n - 1` does not fit in a port number.
    pub fn contiguous(host: &str, base_port: u16, n: usize) -> Option<Self> {
        let ports = (0..n)
            .map(|i| u16::try_from(i).ok().and_then(|offset| base_port.checked_add(offset)))
            .collect::<Option<Vec<u16>>>()?;
        Some(Self::from_ports(host, &ports))
    }

    pub fn from_ports(host: &str, ports: &[u16]) -> Self {
        Self {
            endpoints: ports
                .iter()
                .map(|port| format!("http://{host}:{port}"))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn base_url(&self, id: NodeId) -> Option<&str> {
        self.endpoints.get(id.index()).map(String::as_str)
    }

    pub fn url(&self, id: NodeId, path: &str) -> Option<String> {
        self.base_url(id).map(|base| format!("{base}/{}", path.trim_start_matches('/')))
    }

    pub fn message_url(&self, id: NodeId) -> Option<String> {
        self.url(id, "message")
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.endpoints.len()).map(NodeId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_addresses() {
        let book = PeerBook::contiguous("127.0.0.1", 3000, 3).unwrap();
        assert_eq!(book.base_url(NodeId(2)), Some("http://127.0.0.1:3002"));
        assert_eq!(
            book.message_url(NodeId(1)).as_deref(),
            Some("http://127.0.0.1:3001/message")
        );
        assert_eq!(book.url(NodeId(0), "/getState").as_deref(), Some("http://127.0.0.1:3000/getState"));
        assert_eq!(book.base_url(NodeId(3)), None);
        assert_eq!(book.ids().count(), 3);
    }

    #[test]
    fn test_port_overflow() {
        assert!(PeerBook::contiguous("localhost", u16::MAX, 1).is_some());
        assert!(PeerBook::contiguous("localhost", u16::MAX, 2).is_none());
    }

    #[test]
    fn test_explicit_ports() {
        let book = PeerBook::from_ports("localhost", &[4100, 4007]);
        assert_eq!(book.base_url(NodeId(1)), Some("http://localhost:4007"));
        assert_eq!(book.len(), 2);
    }
}
