use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use benor_common::{BenOrError, NodeId, ProtocolParams, Result, Value};
use benor_consensus::ProtocolConfig;
use benor_p2p::PeerBook;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_base_port() -> u16 {
    3000
}

/// Description of a whole network: who takes part, what they start with and
/// where they listen.
///
/// `base_port = 0` asks the launcher for ephemeral ports, which only works
/// when every node runs inside one process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub n: usize,
    pub f: usize,
    pub initial_values: Vec<Value>,
    /// Indices of faulty nodes.
    #[serde(default)]
    pub faulty: Vec<usize>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_base_port")]
    pub base_port: u16,
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

impl NetworkConfig {
    pub fn new(n: usize, f: usize, initial_values: Vec<Value>, faulty: Vec<usize>) -> Self {
        Self {
            n,
            f,
            initial_values,
            faulty,
            host: default_host(),
            base_port: default_base_port(),
            protocol: ProtocolConfig::default(),
        }
    }

    pub fn params(&self) -> ProtocolParams {
        ProtocolParams::new(self.n, self.f)
    }

    /// Rejects configurations nodes cannot be built from.
    pub fn validate(&self) -> Result<()> {
        if self.n == 0 {
            return Err(BenOrError::Config("a network needs at least one node".into()));
        }
        if self.initial_values.len() != self.n {
            return Err(BenOrError::Config(format!(
                "expected {} initial values, got {}",
                self.n,
                self.initial_values.len()
            )));
        }
        if let Some(bad) = self.faulty.iter().find(|i| **i >= self.n) {
            return Err(BenOrError::Config(format!(
                "faulty index {} is out of range for n={}",
                bad, self.n
            )));
        }
        Ok(())
    }

    pub fn is_faulty(&self, id: NodeId) -> bool {
        self.faulty.contains(&id.index())
    }

    pub fn faulty_flags(&self) -> Vec<bool> {
        (0..self.n).map(|i| self.is_faulty(NodeId(i))).collect()
    }

    pub fn initial_value(&self, id: NodeId) -> Result<Value> {
        self.initial_values
            .get(id.index())
            .copied()
            .ok_or_else(|| BenOrError::Config(format!("{} is not part of the network", id)))
    }

    pub fn port(&self, id: NodeId) -> Result<u16> {
        u16::try_from(id.index())
            .ok()
            .and_then(|offset| self.base_port.checked_add(offset))
            .ok_or_else(|| BenOrError::Config(format!("no port for {} above {}", id, self.base_port)))
    }

    /// The contiguous `host:base_port + i` address book.
    pub fn peer_book(&self) -> Result<PeerBook> {
        if self.base_port == 0 {
            return Err(BenOrError::Config(
                "base_port 0 has no fixed addresses; launch the network in one process".into(),
            ));
        }
        PeerBook::contiguous(&self.host, self.base_port, self.n).ok_or_else(|| {
            BenOrError::Config(format!(
                "{} nodes do not fit above port {}",
                self.n, self.base_port
            ))
        })
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let json = r#"{ "n": 3, "f": 1, "initial_values": [0, 1, 1] }"#;
        let config: NetworkConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.base_port, 3000);
        assert!(config.faulty.is_empty());
        assert_eq!(config.protocol, ProtocolConfig::default());
        assert_eq!(config.initial_values, vec![Value::Zero, Value::One, Value::One]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let short = NetworkConfig::new(3, 1, vec![Value::One], vec![]);
        assert!(matches!(short.validate(), Err(BenOrError::Config(_))));

        let out_of_range = NetworkConfig::new(2, 0, vec![Value::One; 2], vec![2]);
        assert!(out_of_range.validate().is_err());

        let empty = NetworkConfig::new(0, 0, vec![], vec![]);
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_faulty_flags_and_ports() {
        let config = NetworkConfig::new(4, 1, vec![Value::Zero; 4], vec![2]);
        assert_eq!(config.faulty_flags(), vec![false, false, true, false]);
        assert_eq!(config.port(NodeId(3)).unwrap(), 3003);

        let book = config.peer_book().unwrap();
        assert_eq!(
            book.message_url(NodeId(2)).as_deref(),
            Some("http://127.0.0.1:3002/message")
        );
    }

    #[test]
    fn test_ephemeral_ports_have_no_peer_book() {
        let mut config = NetworkConfig::new(2, 0, vec![Value::Zero; 2], vec![]);
        config.base_port = 0;
        assert!(config.peer_book().is_err());
    }
}
