use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Broken cycle at hop {hop}: expected {expected}, found {found}")]
    BrokenCycle {
        hop: usize,
        expected: String,
        found: String,
    },

    #[error("Price data inconsistency on pool {pool}: sqrt and tick prices diverge by {deviation_pct}%")]
    PriceDataInconsistency { pool: String, deviation_pct: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Evaluation task failed: {0}")]
    Task(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),

    #[error("Parse decimal error: {0}")]
    ParseDecimal(#[from] bigdecimal::ParseBigDecimalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}
