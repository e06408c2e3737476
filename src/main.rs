use anyhow::{Context, Result};
use arbitrage_verifier::{aggregator, config, utils};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let app = config::AppConfig::load().context("loading configuration")?;
    tracing::info!(
        scenario_dir = %app.scenario_dir.display(),
        price_tolerance_pct = %app.arbitrage.price_tolerance_pct,
        triangle_tolerance_pct = %app.arbitrage.triangle_tolerance_pct,
        strict = app.arbitrage.strict_price_check,
        "[INIT] arbitrage-verifier starting"
    );

    let mut scenarios = config::load_scenarios(&app.scenario_dir)
        .await
        .with_context(|| format!("reading scenarios from {}", app.scenario_dir.display()))?;
    if let Some(cost) = &app.execution_cost_override {
        for scenario in &mut scenarios {
            scenario.cycle.execution_cost = cost.clone();
        }
    }
    tracing::info!(count = scenarios.len(), "[INIT] scenarios loaded");

    let outcomes = aggregator::evaluate_scenarios(scenarios, app.arbitrage.clone()).await;

    let mut failures = 0usize;
    let mut reports = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome.report {
            Ok(report) => reports.push(report),
            Err(e) => {
                failures += 1;
                tracing::warn!(scenario = %outcome.name, error = %e, "[REPORT] skipped");
            }
        }
    }

    if app.output_json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print!("{}", report.render_text());
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} scenario(s) failed");
    }
    Ok(())
}
