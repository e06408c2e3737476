use bigdecimal::BigDecimal;
use num_traits::{One, Zero};

use crate::dex::state::PoolPriceState;
use crate::errors::{AppError, Result};
use crate::models::SwapDirection;
use crate::utils::normalize;

/// Outcome of one simulated hop.
#[derive(Debug, Clone)]
pub struct SwapResult {
    pub amount_in: BigDecimal,
    pub amount_out: BigDecimal,
    /// Part of the input kept by the pool, in input-token units.
    pub fee_paid: BigDecimal,
    /// Output tokens received per input token, fee included.
    pub execution_price: BigDecimal,
}

/// One traversal of a pool at a constant price.
#[derive(Debug, Clone)]
pub struct SwapHop {
    pub input_amount: BigDecimal,
    /// token1 per token0, regardless of direction.
    pub price: BigDecimal,
    pub fee_rate: BigDecimal,
    pub direction: SwapDirection,
}

impl SwapHop {
    pub fn simulate(&self) -> Result<SwapResult> {
        let amount_out = simulate_hop(&self.input_amount, &self.price, &self.fee_rate, self.direction)?;
        let fee_paid = normalize(&self.input_amount * &self.fee_rate);
        let execution_price = if self.input_amount.is_zero() {
            BigDecimal::zero()
        } else {
            normalize(&amount_out / &self.input_amount)
        };
        Ok(SwapResult {
            amount_in: self.input_amount.clone(),
            amount_out,
            fee_paid,
            execution_price,
        })
    }
}

/// Output of a single hop with the fee taken exactly once.
///
/// * `Forward`: `amount_in * price * (1 - fee)`
/// * `Reverse`: `amount_in * (1 - fee) / price`
///
/// The price is treated as constant for the whole hop, so trade size has no
/// impact here; see [`SlippageModel`] for that.
pub fn simulate_hop(
    amount_in: &BigDecimal,
    price: &BigDecimal,
    fee_rate: &BigDecimal,
    direction: SwapDirection,
) -> Result<BigDecimal> {
    if amount_in < &BigDecimal::zero() {
        return Err(AppError::InvalidInput(format!("negative input amount {amount_in}")));
    }
    if price <= &BigDecimal::zero() {
        return Err(AppError::InvalidInput(format!("non-positive price {price}")));
    }
    check_fraction(fee_rate, "fee rate")?;

    let after_fee = amount_in * (BigDecimal::one() - fee_rate);
    let amount_out = match direction {
        SwapDirection::Forward => after_fee * price,
        SwapDirection::Reverse => after_fee / price,
    };
    Ok(normalize(amount_out))
}

/// Reject anything outside `[0, 1)`.
fn check_fraction(value: &BigDecimal, what: &str) -> Result<()> {
    if value < &BigDecimal::zero() || value >= &BigDecimal::one() {
        return Err(AppError::InvalidInput(format!("{what} {value} outside [0, 1)")));
    }
    Ok(())
}

/// Price impact of a trade against pool depth.
///
/// The evaluator multiplies each hop's output by `1 - slippage_fraction`.
pub trait SlippageModel: Send + Sync {
    fn slippage_fraction(&self, pool: &PoolPriceState, amount_in: &BigDecimal) -> BigDecimal;
}

/// Constant-price baseline: no impact at any size.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSlippage;

impl SlippageModel for NoSlippage {
    fn slippage_fraction(&self, _pool: &PoolPriceState, _amount_in: &BigDecimal) -> BigDecimal {
        BigDecimal::zero()
    }
}

/// Same fractional haircut on every hop.
#[derive(Debug, Clone)]
pub struct FixedSlippage(pub BigDecimal);

impl SlippageModel for FixedSlippage {
    fn slippage_fraction(&self, _pool: &PoolPriceState, _amount_in: &BigDecimal) -> BigDecimal {
        self.0.clone()
    }
}

/// Apply a model's haircut to a hop output.
pub fn apply_slippage(amount_out: BigDecimal, fraction: &BigDecimal) -> Result<BigDecimal> {
    check_fraction(fraction, "slippage")?;
    if fraction.is_zero() {
        return Ok(amount_out);
    }
    Ok(normalize(amount_out * (BigDecimal::one() - fraction)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn assert_close(actual: &BigDecimal, expected: &BigDecimal, tol: &str) {
        let diff = (actual - expected).abs();
        assert!(diff <= d(tol), "{actual} vs {expected} (diff {diff})");
    }

    #[test]
    fn forward_multiplies_by_price() {
        let out = simulate_hop(&d("2"), &d("3000"), &d("0.003"), SwapDirection::Forward).unwrap();
        assert_eq!(out, d("5982"));
    }

    #[test]
    fn reverse_divides_by_price_after_fee() {
        let out = simulate_hop(&d("6000"), &d("3000"), &d("0.0005"), SwapDirection::Reverse).unwrap();
        assert_eq!(out, d("1.999"));
    }

    #[test]
    fn zero_fee_round_trip_is_identity() {
        let prices = ["3157.4401583774932242", "0.00031952667416332883", "0.9997058957623252", "1"];
        let x = d("2147672.71");
        for p in prices {
            let price = d(p);
            let there = simulate_hop(&x, &price, &BigDecimal::zero(), SwapDirection::Forward).unwrap();
            let back = simulate_hop(&there, &price, &BigDecimal::zero(), SwapDirection::Reverse).unwrap();
            assert_close(&back, &x, "1e-40");
        }
    }

    #[test]
    fn output_strictly_decreases_with_fee() {
        let fees = ["0", "0.0001", "0.0005", "0.003", "0.01", "0.5", "0.999999"];
        for direction in [SwapDirection::Forward, SwapDirection::Reverse] {
            let outs: Vec<BigDecimal> = fees
                .iter()
                .map(|f| simulate_hop(&d("100"), &d("1.5"), &d(f), direction).unwrap())
                .collect();
            for pair in outs.windows(2) {
                assert!(pair[0] > pair[1], "{direction}: {} !> {}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn zero_input_yields_zero() {
        let out = simulate_hop(&BigDecimal::zero(), &d("2"), &d("0.003"), SwapDirection::Reverse).unwrap();
        assert!(out.is_zero());
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let cases = [
            ("100", "2", "1.5"),
            ("100", "-1", "0.003"),
            ("-5", "2", "0.003"),
            ("100", "0", "0.003"),
            ("100", "2", "1"),
            ("100", "2", "-0.001"),
        ];
        for (amount, price, fee) in cases {
            for direction in [SwapDirection::Forward, SwapDirection::Reverse] {
                let res = simulate_hop(&d(amount), &d(price), &d(fee), direction);
                assert!(
                    matches!(res, Err(AppError::InvalidInput(_))),
                    "{amount} @ {price} fee {fee} should fail, got {res:?}"
                );
            }
        }
    }

    #[test]
    fn hop_reports_fee_and_execution_price() {
        let hop = SwapHop {
            input_amount: d("1000"),
            price: d("2"),
            fee_rate: d("0.003"),
            direction: SwapDirection::Forward,
        };
        let res = hop.simulate().unwrap();
        assert_eq!(res.amount_out, d("1994"));
        assert_eq!(res.fee_paid, d("3"));
        assert_eq!(res.execution_price, d("1.994"));
    }

    #[test]
    fn slippage_haircut_is_bounded() {
        assert_eq!(apply_slippage(d("100"), &d("0.01")).unwrap(), d("99"));
        assert_eq!(apply_slippage(d("100"), &BigDecimal::zero()).unwrap(), d("100"));
        assert!(apply_slippage(d("100"), &d("1")).is_err());
    }
}
