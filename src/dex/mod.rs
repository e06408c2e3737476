//! Pool-level math for Uniswap V3 style pools: price derivation and
//! single-hop swap simulation.

pub mod calc;
pub mod price;
pub mod state;

pub use calc::{FixedSlippage, NoSlippage, SlippageModel, SwapHop, SwapResult, simulate_hop};
pub use price::{
    PriceCrossCheck, cross_check, peg_deviation_pct, pool_price, price_from_sqrt_price_x96,
    price_from_tick,
};
pub use state::{PoolPriceState, fee_rate_from_pips, sqrt_price_x96_at_tick};
