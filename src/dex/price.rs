//! Decimal prices from the two on-chain encodings of a pool price.
//!
//! ## Math
//!
//! `sqrtPriceX96` encodes `sqrt(P) * 2^96`, where `P = token1 / token0` in
//! raw units, so `P_raw = sqrtPriceX96^2 / 2^192`. The tick encodes the same
//! price on a logarithmic grid, `P_raw ≈ 1.0001^tick`. Either raw price is
//! brought to whole-token units with `10^(decimals0 - decimals1)`.
//!
//! Everything is computed with `BigDecimal`; nothing here goes through `f64`.

use alloy_primitives::U256;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::dex::state::PoolPriceState;
use crate::utils::{normalize, pow10, u256_to_decimal};

/// 1.0001, the ratio between two adjacent ticks.
fn tick_base() -> BigDecimal {
    BigDecimal::new(BigInt::from(10_001), 4)
}

/// 2^192, the denominator of a squared Q96 value.
fn q192() -> BigDecimal {
    BigDecimal::from(BigInt::from(1) << 192)
}

/// Multiplier that turns a raw-unit ratio into a whole-token price.
pub fn decimal_adjustment(decimals0: u8, decimals1: u8) -> BigDecimal {
    pow10(i64::from(decimals0) - i64::from(decimals1))
}

/// Price of one whole token0 in token1, from `sqrtPriceX96`.
///
/// A zero input yields zero; whether that is a usable pool is the caller's
/// call.
pub fn price_from_sqrt_price_x96(sqrt_price_x96: U256, decimals0: u8, decimals1: u8) -> BigDecimal {
    if sqrt_price_x96.is_zero() {
        return BigDecimal::zero();
    }
    let sqrt = u256_to_decimal(sqrt_price_x96);
    let raw_price = (&sqrt * &sqrt) / q192();
    normalize(raw_price * decimal_adjustment(decimals0, decimals1))
}

/// `1.0001^tick`, exponentiation by squaring at working precision.
pub fn tick_ratio(tick: i32) -> BigDecimal {
    let mut result = BigDecimal::one();
    let mut factor = tick_base();
    let mut exp = tick.unsigned_abs();
    while exp > 0 {
        if exp & 1 == 1 {
            result = normalize(result * &factor);
        }
        exp >>= 1;
        if exp > 0 {
            factor = normalize(&factor * &factor);
        }
    }
    if tick < 0 {
        normalize(BigDecimal::one() / result)
    } else {
        result
    }
}

/// Price of one whole token0 in token1, from the tick.
pub fn price_from_tick(tick: i32, decimals0: u8, decimals1: u8) -> BigDecimal {
    normalize(tick_ratio(tick) * decimal_adjustment(decimals0, decimals1))
}

/// Primary price of a pool: token1 per token0, from `sqrtPriceX96`.
pub fn pool_price(pool: &PoolPriceState) -> BigDecimal {
    price_from_sqrt_price_x96(pool.sqrt_price_x96, pool.asset0.decimals, pool.asset1.decimals)
}

/// Both derivations of one pool's price side by side.
#[derive(Debug, Clone)]
pub struct PriceCrossCheck {
    pub from_sqrt_price: BigDecimal,
    pub from_tick: BigDecimal,
    /// `|sqrt - tick| / sqrt * 100`; `None` when the sqrt price is zero.
    pub deviation_pct: Option<BigDecimal>,
}

impl PriceCrossCheck {
    /// An undefined deviation never counts as consistent.
    pub fn is_consistent(&self, tolerance_pct: &BigDecimal) -> bool {
        match &self.deviation_pct {
            Some(dev) => dev <= tolerance_pct,
            None => false,
        }
    }
}

pub fn cross_check(pool: &PoolPriceState) -> PriceCrossCheck {
    let from_sqrt_price = pool_price(pool);
    let from_tick = price_from_tick(pool.tick, pool.asset0.decimals, pool.asset1.decimals);
    let deviation_pct = if from_sqrt_price.is_zero() {
        None
    } else {
        let diff = (&from_sqrt_price - &from_tick).abs();
        Some(normalize(diff / &from_sqrt_price * BigDecimal::from(100)))
    };
    PriceCrossCheck {
        from_sqrt_price,
        from_tick,
        deviation_pct,
    }
}

/// Distance of a stable/stable price from its 1:1 peg, in percent.
pub fn peg_deviation_pct(price: &BigDecimal) -> BigDecimal {
    (price - BigDecimal::one()).abs() * BigDecimal::from(100)
}
