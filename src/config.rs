//! Configuration loader, application settings and scenario files.

use alloy_primitives::{Address, U256};
use bigdecimal::BigDecimal;
use num_traits::One;
use serde::Deserialize;
use std::env::VarError;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::arbitrage::{ArbitrageConfig, ArbitrageCycle, CycleHop, ReportedProfit, Valuation};
use crate::dex::{PoolPriceState, fee_rate_from_pips, pool_price};
use crate::errors::{AppError, Result};
use crate::models::{Asset, SwapDirection};
use crate::utils::{decimal_from_str, normalize};

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding scenario `*.json` files.
    pub scenario_dir: PathBuf,
    pub arbitrage: ArbitrageConfig,
    /// Replaces every scenario's execution cost when set.
    pub execution_cost_override: Option<BigDecimal>,
    /// Print reports as JSON instead of text.
    pub output_json: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let scenario_dir = PathBuf::from(env_or("SCENARIO_DIR", "scenarios")?);
        let price_tolerance_pct = BigDecimal::from_str(&env_or("PRICE_TOLERANCE_PCT", "0.1")?)?;
        let triangle_tolerance_pct =
            BigDecimal::from_str(&env_or("TRIANGLE_TOLERANCE_PCT", "0.01")?)?;
        let strict_price_check = env_flag("STRICT_PRICE_CHECK")?;
        let execution_cost_override = match std::env::var("EXECUTION_COST_USD") {
            Ok(raw) => Some(BigDecimal::from_str(&raw)?),
            Err(VarError::NotPresent) => None,
            Err(e) => return Err(e.into()),
        };
        let output_json = env_flag("OUTPUT_JSON")?;

        Ok(Self {
            scenario_dir,
            arbitrage: ArbitrageConfig {
                price_tolerance_pct,
                triangle_tolerance_pct,
                strict_price_check,
            },
            execution_cost_override,
            output_json,
        })
    }
}

fn env_or(key: &str, default: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(v) => Ok(v),
        Err(VarError::NotPresent) => Ok(default.to_string()),
        Err(e) => Err(e.into()),
    }
}

fn env_flag(key: &str) -> Result<bool> {
    Ok(env_or(key, "0")? == "1")
}

/// One pool as written in a scenario file.
#[derive(Debug, Deserialize)]
pub struct PoolRecord {
    pub label: String,
    #[serde(default)]
    pub address: Option<String>,
    pub asset0: String,
    pub asset1: String,
    /// Decimal string; values exceed `u64`.
    pub sqrt_price_x96: String,
    pub tick: i32,
    /// Fee tier, e.g. 3000 for 0.3%.
    pub fee_pips: u32,
}

#[derive(Debug, Deserialize)]
pub struct RouteStep {
    pub pool: String,
    /// Inferred from the asset flowing in when omitted.
    #[serde(default)]
    pub direction: Option<SwapDirection>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "denomination", rename_all = "lowercase")]
pub enum InputRecord {
    /// Amount given in the reference unit, converted through the valuation.
    Reference {
        #[serde(deserialize_with = "decimal_from_str")]
        amount: BigDecimal,
    },
    /// Amount given in units of the start asset.
    Asset {
        #[serde(deserialize_with = "decimal_from_str")]
        amount: BigDecimal,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ValuationRecord {
    Pegged,
    /// Value the start asset through this pool's price against a pegged asset.
    Pool { pool: String },
}

/// On-disk description of one cycle at one block.
#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    pub name: String,
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default = "default_reference_unit")]
    pub reference_unit: String,
    pub assets: Vec<Asset>,
    pub pools: Vec<PoolRecord>,
    pub route: Vec<RouteStep>,
    /// Needed only when the first route step has no direction.
    #[serde(default)]
    pub start_asset: Option<String>,
    pub input: InputRecord,
    pub valuation: ValuationRecord,
    #[serde(deserialize_with = "decimal_from_str")]
    pub execution_cost: BigDecimal,
    #[serde(default)]
    pub financing_fee_pips: Option<u32>,
    #[serde(default)]
    pub reported: Option<ReportedProfit>,
}

fn default_reference_unit() -> String {
    "USD".to_string()
}

/// A scenario resolved into domain types, ready to evaluate.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub block_number: Option<u64>,
    pub pools: Vec<PoolPriceState>,
    pub cycle: ArbitrageCycle,
    pub reported: Option<ReportedProfit>,
}

impl ScenarioFile {
    pub fn into_scenario(self) -> Result<Scenario> {
        let asset = |symbol: &str| -> Result<Asset> {
            self.assets
                .iter()
                .find(|a| a.symbol == symbol)
                .cloned()
                .ok_or_else(|| AppError::Config(format!("{}: unknown asset {symbol}", self.name)))
        };

        let mut pools = Vec::with_capacity(self.pools.len());
        for record in &self.pools {
            let sqrt_price_x96 = U256::from_str(&record.sqrt_price_x96).map_err(|e| {
                AppError::Config(format!("{}: bad sqrt_price_x96: {e}", record.label))
            })?;
            let mut pool = PoolPriceState::new(
                record.label.clone(),
                asset(&record.asset0)?,
                asset(&record.asset1)?,
                sqrt_price_x96,
                record.tick,
                fee_rate_from_pips(record.fee_pips),
            );
            if let Some(raw) = &record.address {
                let address = Address::from_str(raw)
                    .map_err(|e| AppError::Config(format!("{}: bad address: {e}", record.label)))?;
                pool = pool.with_address(address);
            }
            if let Some(block) = self.block_number {
                pool = pool.at_block(block);
            }
            pools.push(pool);
        }

        let find_pool = |label: &str| -> Result<&PoolPriceState> {
            pools
                .iter()
                .find(|p| p.label == label)
                .ok_or_else(|| AppError::Config(format!("{}: unknown pool {label}", self.name)))
        };

        let mut hops = Vec::with_capacity(self.route.len());
        let mut holding = self.start_asset.clone();
        for step in &self.route {
            let pool = find_pool(&step.pool)?;
            let direction = match (step.direction, &holding) {
                (Some(direction), _) => direction,
                (None, Some(symbol)) => pool.direction_for_input(symbol).ok_or_else(|| {
                    AppError::Config(format!("{}: pool {} does not trade {symbol}", self.name, pool.label))
                })?,
                (None, None) => {
                    return Err(AppError::Config(format!(
                        "{}: cannot infer direction for pool {}",
                        self.name, pool.label
                    )));
                }
            };
            let hop = CycleHop::new(pool.clone(), direction);
            holding = Some(hop.output_asset().symbol.clone());
            hops.push(hop);
        }
        let start = hops
            .first()
            .map(|h| h.input_asset().clone())
            .ok_or_else(|| AppError::Config(format!("{}: empty route", self.name)))?;

        let valuation = match &self.valuation {
            ValuationRecord::Pegged => Valuation::Pegged {
                reference_unit: self.reference_unit.clone(),
            },
            ValuationRecord::Pool { pool } => Valuation::Quoted {
                reference_unit: self.reference_unit.clone(),
                unit_price: quote_through_pool(find_pool(pool)?, &start)?,
            },
        };

        let mut cycle = match self.input {
            InputRecord::Reference { amount } => ArbitrageCycle::from_reference_amount(
                hops,
                amount,
                valuation,
                self.execution_cost,
            )?,
            InputRecord::Asset { amount } => {
                ArbitrageCycle::new(hops, amount, valuation, self.execution_cost)
            }
        };
        if let Some(pips) = self.financing_fee_pips {
            cycle = cycle.with_financing_fee(fee_rate_from_pips(pips));
        }

        Ok(Scenario {
            name: self.name,
            block_number: self.block_number,
            pools,
            cycle,
            reported: self.reported,
        })
    }
}

/// Reference-unit value of one `start` token, read from a pool pairing it
/// with a pegged asset.
fn quote_through_pool(pool: &PoolPriceState, start: &Asset) -> Result<BigDecimal> {
    let price = pool_price(pool);
    let (quote, unit_price) = if pool.asset0.symbol == start.symbol {
        (&pool.asset1, price)
    } else if pool.asset1.symbol == start.symbol && price > BigDecimal::from(0) {
        (&pool.asset0, normalize(BigDecimal::one() / price))
    } else {
        return Err(AppError::Config(format!(
            "valuation pool {} cannot price {start}",
            pool.label
        )));
    };
    if !quote.pegged {
        return Err(AppError::Config(format!(
            "valuation pool {} quotes {start} in {quote}, which is not pegged",
            pool.label
        )));
    }
    Ok(unit_price)
}

pub fn parse_scenario(json: &str) -> Result<Scenario> {
    let file: ScenarioFile = serde_json::from_str(json)?;
    file.into_scenario()
}

/// Read every `*.json` scenario in `dir`, sorted by file name.
pub async fn load_scenarios(dir: &Path) -> Result<Vec<Scenario>> {
    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut scenarios = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = tokio::fs::read_to_string(&path).await?;
        let scenario = parse_scenario(&raw)?;
        debug!(path = %path.display(), name = %scenario.name, "[INIT] scenario loaded");
        scenarios.push(scenario);
    }
    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::to_f64_lossy;

    const WETH_CYCLE: &str = r#"{
        "name": "weth-usdt-usdc",
        "block_number": 23962988,
        "assets": [
            {"symbol": "WETH", "decimals": 18},
            {"symbol": "USDT", "decimals": 6, "pegged": true},
            {"symbol": "USDC", "decimals": 6, "pegged": true}
        ],
        "pools": [
            {"label": "WETH-USDT", "asset0": "WETH", "asset1": "USDT",
             "sqrt_price_x96": "4451917912263315629049748", "tick": -195745, "fee_pips": 3000},
            {"label": "USDC-USDT", "asset0": "USDC", "asset1": "USDT",
             "sqrt_price_x96": "79216510988341235694979128691", "tick": -3, "fee_pips": 100},
            {"label": "USDC-WETH", "asset0": "USDC", "asset1": "WETH",
             "address": "0x88e6a0c2ddd26feeb64f039a2c41296fcb3f5640",
             "sqrt_price_x96": "1416227891581353475536807466141954", "tick": 195833, "fee_pips": 500}
        ],
        "route": [
            {"pool": "WETH-USDT", "direction": "forward"},
            {"pool": "USDC-USDT", "direction": "reverse"},
            {"pool": "USDC-WETH", "direction": "forward"}
        ],
        "input": {"denomination": "reference", "amount": "2147672.71"},
        "valuation": {"kind": "pool", "pool": "WETH-USDT"},
        "execution_cost": "27.02",
        "reported": {"net_profit": "4817.93"}
    }"#;

    #[test]
    fn scenario_file_resolves_into_cycle() {
        let scenario = parse_scenario(WETH_CYCLE).unwrap();
        assert_eq!(scenario.pools.len(), 3);
        assert_eq!(scenario.cycle.hops.len(), 3);
        assert!(scenario.pools[2].address.is_some());
        assert_eq!(scenario.pools[0].block_number, Some(23_962_988));
        assert_eq!(scenario.cycle.start_asset().map(|a| a.symbol.as_str()), Some("WETH"));

        let weth = to_f64_lossy(&scenario.cycle.input_amount);
        assert!((weth - 680.194272).abs() < 1e-6, "got {weth}");
        let reported = scenario.reported.unwrap();
        assert_eq!(reported.net_profit, Some(BigDecimal::from_str("4817.93").unwrap()));
        assert!(reported.gross_profit.is_none());
    }

    #[test]
    fn unknown_pool_in_route_is_a_config_error() {
        let broken = WETH_CYCLE.replace(r#"{"pool": "USDC-USDT", "direction": "reverse"}"#, r#"{"pool": "DAI-USDT", "direction": "reverse"}"#);
        assert!(matches!(parse_scenario(&broken), Err(AppError::Config(_))));
    }

    #[test]
    fn valuation_pool_must_quote_a_pegged_asset() {
        let broken = WETH_CYCLE.replace(r#""pool": "WETH-USDT"}"#, r#""pool": "USDC-WETH"}"#);
        // USDC-WETH quotes WETH in USDC, which is pegged: accepted
        assert!(parse_scenario(&broken).is_ok());
        let unpegged = WETH_CYCLE.replace(
            r#"{"symbol": "USDT", "decimals": 6, "pegged": true}"#,
            r#"{"symbol": "USDT", "decimals": 6}"#,
        );
        assert!(matches!(parse_scenario(&unpegged), Err(AppError::Config(_))));
    }

    #[test]
    fn omitted_directions_follow_the_held_asset() {
        let inferred = WETH_CYCLE
            .replace(r#", "direction": "forward"}"#, "}")
            .replace(r#", "direction": "reverse"}"#, "}")
            .replace(r#""route": ["#, r#""start_asset": "WETH", "route": ["#);
        let scenario = parse_scenario(&inferred).unwrap();
        let directions: Vec<_> = scenario.cycle.hops.iter().map(|h| h.direction).collect();
        assert_eq!(
            directions,
            [SwapDirection::Forward, SwapDirection::Reverse, SwapDirection::Forward]
        );

        let no_start = inferred.replace(r#""start_asset": "WETH", "#, "");
        assert!(matches!(parse_scenario(&no_start), Err(AppError::Config(_))));
    }

    #[test]
    fn numeric_amounts_are_rejected() {
        let numeric_amount = WETH_CYCLE.replace(r#""amount": "2147672.71""#, r#""amount": 2147672.71"#);
        assert!(matches!(parse_scenario(&numeric_amount), Err(AppError::SerdeJson(_))));

        let numeric_cost = WETH_CYCLE.replace(r#""execution_cost": "27.02""#, r#""execution_cost": 27.02"#);
        assert!(matches!(parse_scenario(&numeric_cost), Err(AppError::SerdeJson(_))));

        let numeric_reported = WETH_CYCLE.replace(r#""net_profit": "4817.93""#, r#""net_profit": 4817.93"#);
        assert!(matches!(parse_scenario(&numeric_reported), Err(AppError::SerdeJson(_))));
    }

    #[test]
    fn string_amounts_keep_every_digit() {
        let scenario = parse_scenario(WETH_CYCLE).unwrap();
        assert_eq!(scenario.cycle.execution_cost, BigDecimal::from_str("27.02").unwrap());
    }

    #[test]
    fn malformed_sqrt_price_is_rejected() {
        let broken = WETH_CYCLE.replace("4451917912263315629049748", "not-a-number");
        assert!(matches!(parse_scenario(&broken), Err(AppError::Config(_))));
    }
}
