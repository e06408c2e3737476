//! Shared data structures used throughout the application.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A token traded through the pools, identified by its symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    /// Power-of-ten scale of the raw on-chain amount (USDC 6, WETH 18).
    pub decimals: u8,
    /// Stablecoin assumed to trade 1:1 with the reference unit.
    #[serde(default)]
    pub pegged: bool,
}

impl Asset {
    pub fn new(symbol: impl Into<String>, decimals: u8, pegged: bool) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            pegged,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// Side of the pool a hop enters from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapDirection {
    /// token0 in → token1 out, `out = in * price * (1 - fee)`
    Forward,
    /// token1 in → token0 out, `out = in * (1 - fee) / price`
    Reverse,
}

impl fmt::Display for SwapDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapDirection::Forward => f.write_str("forward"),
            SwapDirection::Reverse => f.write_str("reverse"),
        }
    }
}
