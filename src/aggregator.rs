//! Aggregator logic for evaluating a batch of scenarios.

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinError;
use tracing::{info, warn};

use crate::{
    arbitrage::ArbitrageConfig,
    config::Scenario,
    errors::{AppError, Result},
    report::{ScenarioReport, build_report},
};

/// Outcome of one scenario; a failing scenario does not abort the batch.
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub name: String,
    pub report: Result<ScenarioReport>,
}

/// Evaluate every scenario on the blocking pool, preserving input order.
pub async fn evaluate_scenarios(
    scenarios: Vec<Scenario>,
    config: ArbitrageConfig,
) -> Vec<ScenarioOutcome> {
    let config = Arc::new(config);
    let tasks = scenarios.into_iter().map(|scenario| {
        let config = Arc::clone(&config);
        let name = scenario.name.clone();
        let handle = tokio::task::spawn_blocking(move || build_report(&scenario, &config));
        async move { joined_outcome(name, handle.await) }
    });

    let outcomes = join_all(tasks).await;
    for outcome in &outcomes {
        match &outcome.report {
            Ok(report) if report.result.is_profitable() => {
                info!(
                    scenario = %outcome.name,
                    gross = %report.result.gross_profit.round(2),
                    net = %report.result.net_profit.round(2),
                    unit = %report.result.reference_unit,
                    "[OPP] profitable cycle"
                );
            }
            Ok(report) => {
                info!(
                    scenario = %outcome.name,
                    net = %report.result.net_profit.round(2),
                    "[EVAL] cycle not profitable"
                );
            }
            Err(e) => warn!(scenario = %outcome.name, error = %e, "[EVAL] scenario failed"),
        }
    }
    outcomes
}

fn joined_outcome(
    name: String,
    joined: std::result::Result<Result<ScenarioReport>, JoinError>,
) -> ScenarioOutcome {
    let report = joined.unwrap_or_else(|e| Err(AppError::Task(e.to_string())));
    ScenarioOutcome { name, report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_scenario;
    use bigdecimal::BigDecimal;

    const PEGGED_CYCLE: &str = r#"{
        "name": "usdc-weth-usdt",
        "assets": [
            {"symbol": "WETH", "decimals": 18},
            {"symbol": "USDT", "decimals": 6, "pegged": true},
            {"symbol": "USDC", "decimals": 6, "pegged": true}
        ],
        "pools": [
            {"label": "USDC-WETH", "asset0": "USDC", "asset1": "WETH",
             "sqrt_price_x96": "1415751629892847547683532427111224", "tick": 195826, "fee_pips": 500},
            {"label": "WETH-USDT", "asset0": "WETH", "asset1": "USDT",
             "sqrt_price_x96": "4441666137082552305574556", "tick": -195791, "fee_pips": 500},
            {"label": "USDC-USDT", "asset0": "USDC", "asset1": "USDT",
             "sqrt_price_x96": "79217445829088751497460178370", "tick": -3, "fee_pips": 100}
        ],
        "route": [
            {"pool": "USDC-WETH", "direction": "forward"},
            {"pool": "WETH-USDT", "direction": "forward"},
            {"pool": "USDC-USDT", "direction": "reverse"}
        ],
        "input": {"denomination": "asset", "amount": "235073.45"},
        "valuation": {"kind": "pegged"},
        "execution_cost": "27.02"
    }"#;

    #[tokio::test]
    async fn batch_keeps_order_and_isolates_failures() {
        let good = parse_scenario(PEGGED_CYCLE).unwrap();
        let mut bad = good.clone();
        bad.name = "negative-cost".into();
        bad.cycle.execution_cost = BigDecimal::from(-1);

        let outcomes = evaluate_scenarios(vec![good, bad], ArbitrageConfig::default()).await;
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].name, "usdc-weth-usdt");
        let report = outcomes[0].report.as_ref().unwrap();
        assert!(report.result.is_profitable());
        assert_eq!(report.pools.len(), 3);
        assert!(report.pools[2].peg_deviation_pct.is_some());
        assert!(report.pools[0].peg_deviation_pct.is_none());
        assert!(matches!(outcomes[1].report, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn panicked_evaluation_is_a_task_error() {
        let joined = tokio::task::spawn_blocking(|| -> Result<ScenarioReport> {
            panic!("evaluation blew up")
        })
        .await;
        let outcome = joined_outcome("panicky".into(), joined);
        assert_eq!(outcome.name, "panicky");
        assert!(matches!(outcome.report, Err(AppError::Task(_))));
    }
}
