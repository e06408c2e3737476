use alloy_primitives::{Address, U256};
use bigdecimal::BigDecimal;
use num_bigint::ToBigInt;

use crate::dex::price::tick_ratio;
use crate::models::{Asset, SwapDirection};

/// Lowest tick a Uniswap V3 style pool can report.
pub const MIN_TICK: i32 = -887_272;
/// Highest tick a Uniswap V3 style pool can report.
pub const MAX_TICK: i32 = 887_272;

/// Fee tiers are quoted in hundredths of a basis point (500 = 0.05%).
const PIPS_PER_UNIT: u32 = 1_000_000;

/// Immutable snapshot of one pool's price at a given block.
///
/// Carries both on-chain encodings of the same price so they can be
/// cross-checked before the snapshot is trusted.
#[derive(Clone, Debug)]
pub struct PoolPriceState {
    /// Human label, e.g. "WETH-USDT 0.3%".
    pub label: String,
    pub address: Option<Address>,
    pub block_number: Option<u64>,
    /// Current sqrt(price1/price0) in Q96 (`slot0.sqrtPriceX96`).
    pub sqrt_price_x96: U256,
    /// Current tick index (`slot0.tick`).
    pub tick: i32,
    /// Fraction of the input kept by the pool on every swap.
    pub fee_rate: BigDecimal,
    pub asset0: Asset,
    pub asset1: Asset,
}

impl PoolPriceState {
    pub fn new(
        label: impl Into<String>,
        asset0: Asset,
        asset1: Asset,
        sqrt_price_x96: U256,
        tick: i32,
        fee_rate: BigDecimal,
    ) -> Self {
        Self {
            label: label.into(),
            address: None,
            block_number: None,
            sqrt_price_x96,
            tick,
            fee_rate,
            asset0,
            asset1,
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn at_block(mut self, block_number: u64) -> Self {
        self.block_number = Some(block_number);
        self
    }

    pub fn input_asset(&self, direction: SwapDirection) -> &Asset {
        match direction {
            SwapDirection::Forward => &self.asset0,
            SwapDirection::Reverse => &self.asset1,
        }
    }

    pub fn output_asset(&self, direction: SwapDirection) -> &Asset {
        match direction {
            SwapDirection::Forward => &self.asset1,
            SwapDirection::Reverse => &self.asset0,
        }
    }

    /// Side of the pool an asset enters from, if the pool trades it at all.
    pub fn direction_for_input(&self, symbol: &str) -> Option<SwapDirection> {
        if self.asset0.symbol == symbol {
            Some(SwapDirection::Forward)
        } else if self.asset1.symbol == symbol {
            Some(SwapDirection::Reverse)
        } else {
            None
        }
    }

    /// Both sides are stablecoins, so the price should sit near 1.
    pub fn is_stable_pair(&self) -> bool {
        self.asset0.pegged && self.asset1.pegged
    }
}

/// Convert an on-chain fee tier (e.g. 3000) to a fraction (0.003).
pub fn fee_rate_from_pips(pips: u32) -> BigDecimal {
    BigDecimal::from(pips) / BigDecimal::from(PIPS_PER_UNIT)
}

/// sqrtPriceX96 implied by a tick, floored to an integer.
///
/// Decimal counterpart of `TickMath.getSqrtRatioAtTick`; used to build
/// snapshots whose two encodings agree by construction.
pub fn sqrt_price_x96_at_tick(tick: i32) -> U256 {
    let q96 = BigDecimal::from(num_bigint::BigInt::from(1) << 96);
    let sqrt = tick_ratio(tick).sqrt().unwrap_or_default();
    let value = sqrt * q96;
    let Some(int) = value.to_bigint() else {
        return U256::ZERO;
    };
    let (_, bytes) = int.to_bytes_be();
    U256::try_from_be_slice(&bytes).unwrap_or(U256::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn weth() -> Asset {
        Asset::new("WETH", 18, false)
    }

    fn usdt() -> Asset {
        Asset::new("USDT", 6, true)
    }

    #[test]
    fn fee_tiers_convert_to_fractions() {
        assert_eq!(fee_rate_from_pips(3000), BigDecimal::from_str("0.003").unwrap());
        assert_eq!(fee_rate_from_pips(500), BigDecimal::from_str("0.0005").unwrap());
        assert_eq!(fee_rate_from_pips(100), BigDecimal::from_str("0.0001").unwrap());
    }

    #[test]
    fn direction_selects_assets() {
        let pool = PoolPriceState::new("WETH-USDT", weth(), usdt(), U256::ZERO, 0, fee_rate_from_pips(3000));
        assert_eq!(pool.input_asset(SwapDirection::Forward).symbol, "WETH");
        assert_eq!(pool.output_asset(SwapDirection::Forward).symbol, "USDT");
        assert_eq!(pool.input_asset(SwapDirection::Reverse).symbol, "USDT");
        assert_eq!(pool.output_asset(SwapDirection::Reverse).symbol, "WETH");
        assert_eq!(pool.direction_for_input("USDT"), Some(SwapDirection::Reverse));
        assert_eq!(pool.direction_for_input("DAI"), None);
        assert!(!pool.is_stable_pair());
    }

    #[test]
    fn tick_zero_is_q96() {
        let q96 = U256::from(1u8) << 96;
        let derived = sqrt_price_x96_at_tick(0);
        let diff = if derived > q96 { derived - q96 } else { q96 - derived };
        assert!(diff <= U256::from(1u8), "got {derived}");
    }

    #[test]
    fn sqrt_price_at_tick_tracks_recorded_snapshot() {
        // slot0 of the WETH-USDT 0.3% pool: tick -195745
        let recorded = U256::from_str("4451917912263315629049748").unwrap();
        let derived = sqrt_price_x96_at_tick(-195_745);
        assert!(derived <= recorded, "tick is the floor of the price");
        // one tick is a 0.005% step in sqrt space
        let gap = recorded - derived;
        assert!(gap * U256::from(20_000u32) < recorded, "gap {gap} wider than one tick");
    }

    #[test]
    fn extreme_ticks_stay_in_uint160() {
        let max = sqrt_price_x96_at_tick(MAX_TICK);
        let min = sqrt_price_x96_at_tick(MIN_TICK);
        assert!(max < U256::from(1u8) << 160);
        assert!(min > U256::ZERO);
    }
}
