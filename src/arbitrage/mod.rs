pub mod evaluator;
pub mod types;

pub use evaluator::{
    assess_triangle, check_triangle_consistency, compare_to_reported, cycle_rates, evaluate_cycle,
    evaluate_cycle_with, validate_cycle,
};
pub use types::{
    ArbitrageConfig, ArbitrageCycle, CycleHop, EvaluationResult, HopOutcome, PriceWarning,
    ProfitDiscrepancy, ReportedProfit, TriangleAssessment, Valuation,
};
