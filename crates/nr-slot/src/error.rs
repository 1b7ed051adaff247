//! Error types for the slot engine

use thiserror::Error;

/// Engine error type
#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Insufficient funds: balance {balance} is below bet {bet}")]
    InsufficientFunds { balance: f64, bet: f64 },

    #[error("Invalid bet amount {requested} (allowed {min}..={max}, balance {balance})")]
    InvalidBetAmount {
        requested: f64,
        min: f64,
        max: f64,
        balance: f64,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SlotError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Rejections leave the session untouched and can be shown to the player
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InsufficientFunds { .. } | Self::InvalidBetAmount { .. }
        )
    }
}

/// Result type alias
pub type SlotResult<T> = Result<T, SlotError>;
