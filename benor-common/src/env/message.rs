//! message.rs
//!
//! Protocol vocabulary: binary values, the two phases of a round, and the
//! immutable message exchanged between nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::NodeId;

/// A binary protocol value. Serialized as the integers `0` and `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Value {
    Zero,
    One,
}

impl Value {
    /// `k mod 2` as a value.
    pub fn from_parity(round: u64) -> Self {
        if round % 2 == 0 {
            Value::Zero
        } else {
            Value::One
        }
    }

    pub fn from_bool(bit: bool) -> Self {
        if bit {
            Value::One
        } else {
            Value::Zero
        }
    }
}

impl From<Value> for u8 {
    fn from(v: Value) -> Self {
        match v {
            Value::Zero => 0,
            Value::One => 1,
        }
    }
}

impl TryFrom<u8> for Value {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Value::Zero),
            1 => Ok(Value::One),
            other => Err(format!("binary value expected, got {other}")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// The two sub-rounds of a consensus round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Raw proposals.
    R,
    /// Tie-broken proposals.
    P,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::R => write!(f, "R"),
            Phase::P => write!(f, "P"),
        }
    }
}

/// One vote for one phase of one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub phase: Phase,
    pub sender_id: NodeId,
    pub round: u64,
    pub value: Value,
}

impl Message {
    pub fn new(phase: Phase, sender_id: NodeId, round: u64, value: Value) -> Self {
        Self { phase, sender_id, round, value }
    }
}
