use serde::{Deserialize, Serialize};

use super::message::Value;

/// Observable state of one node.
///
/// `None` in `value`, `decided` and `round` is the non-participating sentinel
/// carried by faulty nodes for their whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    pub killed: bool,
    #[serde(rename = "x")]
    pub value: Option<Value>,
    pub decided: Option<bool>,
    #[serde(rename = "k")]
    pub round: Option<u64>,
}

impl NodeState {
    /// Fresh state of a participating node: round 1, undecided.
    pub fn participating(initial: Value) -> Self {
        Self {
            killed: false,
            value: Some(initial),
            decided: Some(false),
            round: Some(1),
        }
    }

    /// State of a faulty node.
    pub fn faulty() -> Self {
        Self {
            killed: false,
            value: None,
            decided: None,
            round: None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.value.is_none() && self.decided.is_none() && self.round.is_none()
    }

    pub fn is_decided(&self) -> bool {
        self.decided == Some(true)
    }
}
