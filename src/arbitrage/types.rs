use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::dex::PoolPriceState;
use crate::errors::{AppError, Result};
use crate::models::{Asset, SwapDirection};
use crate::utils::{normalize, opt_decimal_from_str};

/// Configuration for arbitrage calculations
#[derive(Debug, Clone)]
pub struct ArbitrageConfig {
    /// Largest accepted sqrt-vs-tick price gap, in percent.
    pub price_tolerance_pct: BigDecimal,
    /// Largest loop deviation still treated as arbitrage-free, in percent.
    pub triangle_tolerance_pct: BigDecimal,
    /// Turn price inconsistencies into errors instead of warnings.
    pub strict_price_check: bool,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            // 0.1% and 0.01%
            price_tolerance_pct: BigDecimal::new(BigInt::from(1), 1),
            triangle_tolerance_pct: BigDecimal::new(BigInt::from(1), 2),
            strict_price_check: false,
        }
    }
}

/// One pool traversed in a fixed direction.
#[derive(Debug, Clone)]
pub struct CycleHop {
    pub pool: PoolPriceState,
    pub direction: SwapDirection,
}

impl CycleHop {
    pub fn new(pool: PoolPriceState, direction: SwapDirection) -> Self {
        Self { pool, direction }
    }

    pub fn input_asset(&self) -> &Asset {
        self.pool.input_asset(self.direction)
    }

    pub fn output_asset(&self) -> &Asset {
        self.pool.output_asset(self.direction)
    }
}

/// How one unit of the cycle's start asset is expressed in the reference unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Valuation {
    /// The start asset is a stablecoin taken at 1:1. This is an
    /// approximation and is reported as such.
    Pegged { reference_unit: String },
    /// The start asset is worth `unit_price` reference units.
    Quoted {
        reference_unit: String,
        unit_price: BigDecimal,
    },
}

impl Valuation {
    pub fn reference_unit(&self) -> &str {
        match self {
            Valuation::Pegged { reference_unit } | Valuation::Quoted { reference_unit, .. } => {
                reference_unit
            }
        }
    }

    pub fn unit_price(&self) -> BigDecimal {
        match self {
            Valuation::Pegged { .. } => BigDecimal::from(1),
            Valuation::Quoted { unit_price, .. } => unit_price.clone(),
        }
    }
}

/// A closed route: the last hop's output asset is the first hop's input.
#[derive(Debug, Clone)]
pub struct ArbitrageCycle {
    pub hops: Vec<CycleHop>,
    /// Amount of the start asset fed into the first hop.
    pub input_amount: BigDecimal,
    pub valuation: Valuation,
    /// Fixed cost of executing the route, in the reference unit.
    pub execution_cost: BigDecimal,
    /// Fraction of the input value paid to borrow the input (flash loan).
    pub financing_fee_rate: BigDecimal,
}

impl ArbitrageCycle {
    pub fn new(
        hops: Vec<CycleHop>,
        input_amount: BigDecimal,
        valuation: Valuation,
        execution_cost: BigDecimal,
    ) -> Self {
        Self {
            hops,
            input_amount,
            valuation,
            execution_cost,
            financing_fee_rate: BigDecimal::zero(),
        }
    }

    /// Build a cycle from an input sized in the reference unit (e.g. USD),
    /// converting it to start-asset units through the valuation.
    pub fn from_reference_amount(
        hops: Vec<CycleHop>,
        reference_amount: BigDecimal,
        valuation: Valuation,
        execution_cost: BigDecimal,
    ) -> Result<Self> {
        let unit_price = valuation.unit_price();
        if unit_price <= BigDecimal::zero() {
            return Err(AppError::InvalidInput(format!(
                "valuation price {unit_price} must be positive"
            )));
        }
        let input_amount = normalize(reference_amount / unit_price);
        Ok(Self::new(hops, input_amount, valuation, execution_cost))
    }

    pub fn with_financing_fee(mut self, rate: BigDecimal) -> Self {
        self.financing_fee_rate = rate;
        self
    }

    pub fn start_asset(&self) -> Option<&Asset> {
        self.hops.first().map(CycleHop::input_asset)
    }
}

/// What happened on one hop of an evaluated cycle.
#[derive(Debug, Clone, Serialize)]
pub struct HopOutcome {
    pub pool: String,
    pub direction: SwapDirection,
    pub input_asset: String,
    pub output_asset: String,
    pub amount_in: BigDecimal,
    /// Pool price used, token1 per token0.
    pub price: BigDecimal,
    pub fee_rate: BigDecimal,
    pub fee_paid: BigDecimal,
    /// Output per input unit with the fee taken, before slippage.
    pub execution_price: BigDecimal,
    pub slippage: BigDecimal,
    pub amount_out: BigDecimal,
}

/// A pool whose two price encodings disagree beyond tolerance.
#[derive(Debug, Clone, Serialize)]
pub struct PriceWarning {
    pub pool: String,
    pub from_sqrt_price: BigDecimal,
    pub from_tick: BigDecimal,
    pub deviation_pct: Option<BigDecimal>,
}

/// Profit and loss of one evaluated cycle.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub reference_unit: String,
    /// Value taken at 1:1 through a stablecoin peg.
    pub peg_approximation: bool,
    pub input_amount: BigDecimal,
    pub input_value: BigDecimal,
    pub final_amount: BigDecimal,
    pub final_value: BigDecimal,
    pub gross_profit: BigDecimal,
    pub execution_cost: BigDecimal,
    pub net_profit: BigDecimal,
    pub financing_cost: BigDecimal,
    pub net_profit_after_financing: BigDecimal,
    /// Gross profit over input value, in percent.
    pub profit_margin_pct: BigDecimal,
    pub per_hop_outputs: Vec<HopOutcome>,
    pub warnings: Vec<PriceWarning>,
}

impl EvaluationResult {
    pub fn is_profitable(&self) -> bool {
        self.net_profit > BigDecimal::zero()
    }

    pub fn hop_amounts(&self) -> Vec<&BigDecimal> {
        self.per_hop_outputs.iter().map(|h| &h.amount_out).collect()
    }

    /// Profit figures are unreliable when any pool failed its cross-check.
    pub fn has_price_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Cheap pre-filter computed from prices alone.
#[derive(Debug, Clone, Serialize)]
pub struct TriangleAssessment {
    /// Loop mispricing: product of the hop rates minus one, in percent.
    pub deviation_pct: BigDecimal,
    /// Sum of the hop fee rates, in percent.
    pub total_fee_pct: BigDecimal,
    /// Deviation within the configured tolerance.
    pub consistent: bool,
    /// Deviation exceeds total fees, so a full simulation is worth running.
    pub may_be_profitable: bool,
}

/// Figures the backtest reported for the same opportunity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportedProfit {
    #[serde(default, deserialize_with = "opt_decimal_from_str")]
    pub gross_profit: Option<BigDecimal>,
    #[serde(default, deserialize_with = "opt_decimal_from_str")]
    pub net_profit: Option<BigDecimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfitDiscrepancy {
    pub metric: String,
    pub reported: BigDecimal,
    pub computed: BigDecimal,
    /// `reported - computed`
    pub difference: BigDecimal,
}
