use benor_common::Value;

/// Value proposed in phase P when phase R produced no strict majority.
///
/// The policy is a type parameter of the node, fixed at build time, so a run
/// never mixes policies.
pub trait TieBreak: Default + Send + Sync + 'static {
    const NAME: &'static str;

    fn choose(&self, round: u64) -> Value;
}

/// `round mod 2`. Reproducible; every node breaks the same tie the same way.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParityTieBreak;

impl TieBreak for ParityTieBreak {
    const NAME: &'static str = "parity";

    fn choose(&self, round: u64) -> Value {
        Value::from_parity(round)
    }
}

/// Uniform random bit, the common-coin-free variant of Ben-Or.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoinTieBreak;

impl TieBreak for CoinTieBreak {
    const NAME: &'static str = "coin";

    fn choose(&self, _round: u64) -> Value {
        Value::from_bool(rand::random::<bool>())
    }
}

#[cfg(not(feature = "randomized-tiebreak"))]
pub type SelectedTieBreak = ParityTieBreak;

#[cfg(feature = "randomized-tiebreak")]
pub type SelectedTieBreak = CoinTieBreak;
