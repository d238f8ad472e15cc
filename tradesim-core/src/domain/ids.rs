use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic position identifier.
///
/// Derived from the inputs that open the position rather than drawn at random,
/// so replaying the same candles with the same strategy reproduces the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub String);

impl PositionId {
    /// Length of the hex id, in characters.
    pub const LEN: usize = 10;

    /// Hash symbol, strategy tag, open timestamp and sequence number with BLAKE3.
    pub fn derive(symbol: &str, strategy: &str, opened_at: Option<i64>, sequence: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(symbol.as_bytes());
        hasher.update(b"|");
        hasher.update(strategy.as_bytes());
        hasher.update(b"|");
        match opened_at {
            Some(ts) => hasher.update(&ts.to_le_bytes()),
            None => hasher.update(b"-"),
        };
        hasher.update(b"|");
        hasher.update(&sequence.to_le_bytes());
        let hex = hasher.finalize().to_hex();
        Self(hex.as_str()[..Self::LEN].to_string())
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
