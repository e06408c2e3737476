//! Miscellaneous helper utilities.

use alloy_primitives::U256;
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;
use serde::{Deserialize, Deserializer, de};
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt};

/// Significant digits kept on every intermediate decimal result.
///
/// Well above the 64-bit mantissa floor; keeps chained products from
/// growing without bound.
pub const WORKING_PRECISION: u64 = 60;

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Exact `10^exp` for positive or negative exponents.
pub fn pow10(exp: i64) -> BigDecimal {
    // BigDecimal::new(d, s) == d * 10^-s
    BigDecimal::new(BigInt::from(1), -exp)
}

/// Lossless conversion of an on-chain unsigned integer into a decimal.
pub fn u256_to_decimal(value: U256) -> BigDecimal {
    let bytes = value.to_be_bytes::<32>();
    BigDecimal::from(BigInt::from_bytes_be(Sign::Plus, &bytes))
}

/// Round to [`WORKING_PRECISION`] significant digits.
pub fn normalize(value: BigDecimal) -> BigDecimal {
    value.with_prec(WORKING_PRECISION)
}

/// Display-only conversion. Never feed the result back into a calculation.
pub fn to_f64_lossy(value: &BigDecimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Deserialize a decimal written as a JSON string.
///
/// JSON numbers are refused: they reach the visitor as `f64` and would
/// carry binary rounding into the amount.
pub fn decimal_from_str<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    BigDecimal::from_str(&raw).map_err(de::Error::custom)
}

/// Optional variant of [`decimal_from_str`]; pair with `#[serde(default)]`.
pub fn opt_decimal_from_str<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| BigDecimal::from_str(&raw).map_err(de::Error::custom))
        .transpose()
}
