//! Core library for the arbitrage-verifier project.
//!
//! Replays triangular arbitrage cycles across Uniswap V3 style pools from
//! recorded pool state: prices are derived from `sqrtPriceX96` and
//! cross-checked against the tick, each hop is simulated at a constant
//! price with its fee, and the cycle's profit is reported in a reference
//! unit.

pub mod aggregator;
pub mod arbitrage;
pub mod config;
pub mod dex;
pub mod errors;
pub mod models;
pub mod report;
pub mod utils;
