use bigdecimal::BigDecimal;
use num_traits::{One, Zero};
use tracing::{debug, warn};

use super::types::{
    ArbitrageConfig, ArbitrageCycle, CycleHop, EvaluationResult, HopOutcome, PriceWarning,
    ProfitDiscrepancy, ReportedProfit, TriangleAssessment, Valuation,
};
use crate::dex::calc::apply_slippage;
use crate::dex::{NoSlippage, SlippageModel, SwapHop, cross_check, pool_price};
use crate::errors::{AppError, Result};
use crate::models::SwapDirection;
use crate::utils::normalize;

/// Check that every hop feeds the next one and the last feeds the first.
pub fn validate_cycle(hops: &[CycleHop]) -> Result<()> {
    if hops.is_empty() {
        return Err(AppError::BrokenCycle {
            hop: 0,
            expected: "at least one hop".into(),
            found: "none".into(),
        });
    }
    for (i, hop) in hops.iter().enumerate() {
        let next_idx = (i + 1) % hops.len();
        let produced = hop.output_asset();
        let consumed = hops[next_idx].input_asset();
        if produced.symbol != consumed.symbol {
            return Err(AppError::BrokenCycle {
                hop: next_idx,
                expected: produced.symbol.clone(),
                found: consumed.symbol.clone(),
            });
        }
    }
    Ok(())
}

/// Evaluate a cycle under the constant-price baseline.
pub fn evaluate_cycle(cycle: &ArbitrageCycle, config: &ArbitrageConfig) -> Result<EvaluationResult> {
    evaluate_cycle_with(cycle, config, &NoSlippage)
}

/// Evaluate a cycle, applying `slippage` to every hop output.
pub fn evaluate_cycle_with(
    cycle: &ArbitrageCycle,
    config: &ArbitrageConfig,
    slippage: &dyn SlippageModel,
) -> Result<EvaluationResult> {
    validate_cycle(&cycle.hops)?;
    if cycle.execution_cost < BigDecimal::zero() {
        return Err(AppError::InvalidInput(format!(
            "negative execution cost {}",
            cycle.execution_cost
        )));
    }
    if cycle.financing_fee_rate < BigDecimal::zero() || cycle.financing_fee_rate >= BigDecimal::one() {
        return Err(AppError::InvalidInput(format!(
            "financing fee {} outside [0, 1)",
            cycle.financing_fee_rate
        )));
    }

    let warnings = price_warnings(&cycle.hops, config)?;

    // Left-to-right fold: each hop consumes the previous hop's output.
    let mut amount = cycle.input_amount.clone();
    let mut per_hop_outputs = Vec::with_capacity(cycle.hops.len());
    for (i, hop) in cycle.hops.iter().enumerate() {
        let price = pool_price(&hop.pool);
        let swap = SwapHop {
            input_amount: amount.clone(),
            price: price.clone(),
            fee_rate: hop.pool.fee_rate.clone(),
            direction: hop.direction,
        }
        .simulate()?;
        let impact = slippage.slippage_fraction(&hop.pool, &amount);
        let amount_out = apply_slippage(swap.amount_out, &impact)?;

        debug!(
            hop = i,
            pool = %hop.pool.label,
            direction = %hop.direction,
            amount_in = %swap.amount_in,
            amount_out = %amount_out,
            "[EVAL] hop simulated"
        );

        per_hop_outputs.push(HopOutcome {
            pool: hop.pool.label.clone(),
            direction: hop.direction,
            input_asset: hop.input_asset().symbol.clone(),
            output_asset: hop.output_asset().symbol.clone(),
            amount_in: swap.amount_in,
            price,
            fee_rate: hop.pool.fee_rate.clone(),
            fee_paid: swap.fee_paid,
            execution_price: swap.execution_price,
            slippage: impact,
            amount_out: amount_out.clone(),
        });
        amount = amount_out;
    }

    let peg_approximation = check_valuation(cycle)?;
    let unit_price = cycle.valuation.unit_price();
    let input_value = normalize(&cycle.input_amount * &unit_price);
    let final_value = normalize(&amount * &unit_price);
    let gross_profit = &final_value - &input_value;
    let net_profit = &gross_profit - &cycle.execution_cost;
    let financing_cost = normalize(&input_value * &cycle.financing_fee_rate);
    let net_profit_after_financing = &net_profit - &financing_cost;
    let profit_margin_pct = if input_value.is_zero() {
        BigDecimal::zero()
    } else {
        normalize(&gross_profit / &input_value * BigDecimal::from(100))
    };

    Ok(EvaluationResult {
        reference_unit: cycle.valuation.reference_unit().to_string(),
        peg_approximation,
        input_amount: cycle.input_amount.clone(),
        input_value,
        final_amount: amount,
        final_value,
        gross_profit,
        execution_cost: cycle.execution_cost.clone(),
        net_profit,
        financing_cost,
        net_profit_after_financing,
        profit_margin_pct,
        per_hop_outputs,
        warnings,
    })
}

/// Cross-check every pool; warn, or fail in strict mode.
fn price_warnings(hops: &[CycleHop], config: &ArbitrageConfig) -> Result<Vec<PriceWarning>> {
    let mut warnings = Vec::new();
    for hop in hops {
        let check = cross_check(&hop.pool);
        if check.is_consistent(&config.price_tolerance_pct) {
            continue;
        }
        let deviation = check
            .deviation_pct
            .as_ref()
            .map_or_else(|| "undefined".to_string(), ToString::to_string);
        if config.strict_price_check {
            return Err(AppError::PriceDataInconsistency {
                pool: hop.pool.label.clone(),
                deviation_pct: deviation,
            });
        }
        warn!(
            pool = %hop.pool.label,
            from_sqrt = %check.from_sqrt_price,
            from_tick = %check.from_tick,
            deviation_pct = %deviation,
            "[PRICE] sqrt and tick prices disagree"
        );
        warnings.push(PriceWarning {
            pool: hop.pool.label.clone(),
            from_sqrt_price: check.from_sqrt_price,
            from_tick: check.from_tick,
            deviation_pct: check.deviation_pct,
        });
    }
    Ok(warnings)
}

/// Returns whether the value relies on the 1:1 peg approximation.
fn check_valuation(cycle: &ArbitrageCycle) -> Result<bool> {
    match &cycle.valuation {
        Valuation::Pegged { reference_unit } => {
            let start = cycle.start_asset();
            if !start.is_some_and(|a| a.pegged) {
                return Err(AppError::InvalidInput(format!(
                    "{} is not pegged to {reference_unit}",
                    start.map_or("<none>", |a| a.symbol.as_str())
                )));
            }
            debug!(
                asset = ?start.map(|a| a.symbol.as_str()),
                reference = %reference_unit,
                "[EVAL] valuing at 1:1 peg"
            );
            Ok(true)
        }
        Valuation::Quoted { unit_price, .. } => {
            if unit_price <= &BigDecimal::zero() {
                return Err(AppError::InvalidInput(format!(
                    "valuation price {unit_price} must be positive"
                )));
            }
            Ok(false)
        }
    }
}

/// Loop mispricing of three pairwise rates, in percent.
///
/// Each rate converts one unit of an asset into the next asset of the loop
/// (A→B, B→C, C→A). With `actual = price_ab` and `implied = 1 / (price_bc *
/// price_ca)`, the deviation is `(actual - implied) / implied * 100`, which
/// is zero exactly when the three rates multiply to one.
pub fn check_triangle_consistency(
    price_ab: &BigDecimal,
    price_bc: &BigDecimal,
    price_ca: &BigDecimal,
) -> Result<BigDecimal> {
    loop_deviation_pct(&[price_ab.clone(), price_bc.clone(), price_ca.clone()])
}

fn loop_deviation_pct(rates: &[BigDecimal]) -> Result<BigDecimal> {
    if rates.iter().any(|r| r <= &BigDecimal::zero()) {
        return Err(AppError::InvalidInput("loop rates must be positive".into()));
    }
    let product = rates
        .iter()
        .fold(BigDecimal::one(), |acc, r| normalize(acc * r));
    Ok(normalize((product - BigDecimal::one()) * BigDecimal::from(100)))
}

/// Units of each hop's output asset received per unit of its input asset,
/// before fees.
pub fn cycle_rates(cycle: &ArbitrageCycle) -> Result<Vec<BigDecimal>> {
    validate_cycle(&cycle.hops)?;
    cycle
        .hops
        .iter()
        .map(|hop| {
            let price = pool_price(&hop.pool);
            if price <= BigDecimal::zero() {
                return Err(AppError::InvalidInput(format!(
                    "pool {} has no price",
                    hop.pool.label
                )));
            }
            Ok(match hop.direction {
                SwapDirection::Forward => price,
                SwapDirection::Reverse => normalize(BigDecimal::one() / price),
            })
        })
        .collect()
}

/// Price-only pre-filter to run before a full evaluation.
pub fn assess_triangle(cycle: &ArbitrageCycle, config: &ArbitrageConfig) -> Result<TriangleAssessment> {
    let rates = cycle_rates(cycle)?;
    let deviation_pct = loop_deviation_pct(&rates)?;
    let total_fee_pct = cycle
        .hops
        .iter()
        .fold(BigDecimal::zero(), |acc, hop| acc + &hop.pool.fee_rate)
        * BigDecimal::from(100);
    let consistent = deviation_pct.abs() <= config.triangle_tolerance_pct;
    let may_be_profitable = deviation_pct > total_fee_pct;
    Ok(TriangleAssessment {
        deviation_pct,
        total_fee_pct,
        consistent,
        may_be_profitable,
    })
}

/// Line up computed profit against what the backtest reported.
pub fn compare_to_reported(result: &EvaluationResult, reported: &ReportedProfit) -> Vec<ProfitDiscrepancy> {
    let pairs = [
        ("gross_profit", reported.gross_profit.as_ref(), &result.gross_profit),
        ("net_profit", reported.net_profit.as_ref(), &result.net_profit),
    ];
    pairs
        .into_iter()
        .filter_map(|(metric, reported, computed)| {
            reported.map(|r| ProfitDiscrepancy {
                metric: metric.to_string(),
                reported: r.clone(),
                computed: computed.clone(),
                difference: r - computed,
            })
        })
        .collect()
}
