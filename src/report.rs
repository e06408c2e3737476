//! Human- and machine-readable reports built from evaluation results.
//!
//! Nothing here feeds back into the math; `f64` appears only in text
//! formatting.

use bigdecimal::BigDecimal;
use serde::Serialize;
use std::fmt;

use crate::arbitrage::{
    ArbitrageConfig, EvaluationResult, ProfitDiscrepancy, TriangleAssessment, assess_triangle,
    compare_to_reported, evaluate_cycle,
};
use crate::config::Scenario;
use crate::dex::{cross_check, peg_deviation_pct};
use crate::errors::Result;
use crate::utils::to_f64_lossy;

/// Price view of one pool in a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct PoolReport {
    pub label: String,
    /// Checksummed pool address, when the scenario records one.
    pub address: Option<String>,
    pub pair: String,
    pub fee_rate: BigDecimal,
    pub price_from_sqrt: BigDecimal,
    pub price_from_tick: BigDecimal,
    pub deviation_pct: Option<BigDecimal>,
    /// Only for stable/stable pools.
    pub peg_deviation_pct: Option<BigDecimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub block_number: Option<u64>,
    pub pools: Vec<PoolReport>,
    pub triangle: TriangleAssessment,
    pub result: EvaluationResult,
    pub discrepancies: Vec<ProfitDiscrepancy>,
}

/// Evaluate a scenario and gather everything a report shows.
pub fn build_report(scenario: &Scenario, config: &ArbitrageConfig) -> Result<ScenarioReport> {
    let pools = scenario
        .pools
        .iter()
        .map(|pool| {
            let check = cross_check(pool);
            let peg_deviation_pct = pool
                .is_stable_pair()
                .then(|| peg_deviation_pct(&check.from_sqrt_price));
            PoolReport {
                label: pool.label.clone(),
                address: pool.address.map(|a| a.to_checksum(None)),
                pair: format!("{}/{}", pool.asset0, pool.asset1),
                fee_rate: pool.fee_rate.clone(),
                price_from_sqrt: check.from_sqrt_price,
                price_from_tick: check.from_tick,
                deviation_pct: check.deviation_pct,
                peg_deviation_pct,
            }
        })
        .collect();
    let triangle = assess_triangle(&scenario.cycle, config)?;
    let result = evaluate_cycle(&scenario.cycle, config)?;
    let discrepancies = scenario
        .reported
        .as_ref()
        .map(|reported| compare_to_reported(&result, reported))
        .unwrap_or_default();

    Ok(ScenarioReport {
        scenario: scenario.name.clone(),
        block_number: scenario.block_number,
        pools,
        triangle,
        result,
        discrepancies,
    })
}

fn f(value: &BigDecimal) -> f64 {
    to_f64_lossy(value)
}

impl ScenarioReport {
    /// Plain-text rendering for terminal output.
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(72);
        let unit = &self.result.reference_unit;

        writeln!(out, "{rule}")?;
        match self.block_number {
            Some(block) => writeln!(out, "{} @ block {block}", self.scenario)?,
            None => writeln!(out, "{}", self.scenario)?,
        }
        writeln!(out, "{rule}")?;

        writeln!(out, "Pools:")?;
        for pool in &self.pools {
            writeln!(
                out,
                "  {} [{}] fee {:.4}%: sqrt {:.10} | tick {:.10} | gap {}",
                pool.label,
                pool.pair,
                f(&pool.fee_rate) * 100.0,
                f(&pool.price_from_sqrt),
                f(&pool.price_from_tick),
                pool.deviation_pct
                    .as_ref()
                    .map_or_else(|| "n/a".to_string(), |d| format!("{:.6}%", f(d))),
            )?;
            if let Some(address) = &pool.address {
                writeln!(out, "    at {address}")?;
            }
            if let Some(peg) = &pool.peg_deviation_pct {
                writeln!(out, "    off peg by {:.4}%", f(peg))?;
            }
        }

        writeln!(out, "Hops:")?;
        for (i, hop) in self.result.per_hop_outputs.iter().enumerate() {
            writeln!(
                out,
                "  {}. {} → {} via {} ({}): {:.6} → {:.6} @ {:.8} (fee {:.6} {})",
                i + 1,
                hop.input_asset,
                hop.output_asset,
                hop.pool,
                hop.direction,
                f(&hop.amount_in),
                f(&hop.amount_out),
                f(&hop.execution_price),
                f(&hop.fee_paid),
                hop.input_asset,
            )?;
        }

        let r = &self.result;
        writeln!(out, "Profit:")?;
        writeln!(out, "  input        {:>16.2} {unit}", f(&r.input_value))?;
        writeln!(out, "  output       {:>16.2} {unit}", f(&r.final_value))?;
        writeln!(
            out,
            "  gross        {:>16.2} {unit} ({:.4}%)",
            f(&r.gross_profit),
            f(&r.profit_margin_pct)
        )?;
        writeln!(out, "  cost         {:>16.2} {unit}", f(&r.execution_cost))?;
        writeln!(out, "  net          {:>16.2} {unit}", f(&r.net_profit))?;
        if r.financing_cost > BigDecimal::from(0) {
            writeln!(
                out,
                "  net after flash loan {:>8.2} {unit}",
                f(&r.net_profit_after_financing)
            )?;
        }
        if r.peg_approximation {
            writeln!(out, "  (start asset valued 1:1 with {unit})")?;
        }

        let t = &self.triangle;
        writeln!(
            out,
            "Loop deviation {:.4}% vs fees {:.4}%: {}",
            f(&t.deviation_pct),
            f(&t.total_fee_pct),
            if t.may_be_profitable {
                "worth simulating"
            } else {
                "fees dominate"
            }
        )?;

        for d in &self.discrepancies {
            writeln!(
                out,
                "Reported {} {:.2} vs computed {:.2} (diff {:.2})",
                d.metric,
                f(&d.reported),
                f(&d.computed),
                f(&d.difference)
            )?;
        }
        for w in &r.warnings {
            writeln!(out, "WARNING: {} sqrt/tick prices disagree", w.pool)?;
        }
        Ok(())
    }
}
