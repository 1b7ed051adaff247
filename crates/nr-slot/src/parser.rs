//! Config Parser: load a `GameConfig` from JSON or YAML
//!
//! ## Supported Formats
//!
//! - JSON (`.json`)
//! - YAML (`.yaml`, `.yml`)
//!
//! Every field is optional; missing fields fall back to the default game.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let parser = ConfigParser::new();
//! let config = parser.parse_json(json_string)?;
//! ```

use std::path::Path;

use crate::config::GameConfig;
use crate::error::{SlotError, SlotResult};

/// Config parser
#[derive(Debug, Clone, Default)]
pub struct ConfigParser {
    /// Validation limits
    pub limits: ConfigLimits,
}

/// Parsing limits for untrusted files
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    pub max_name_length: usize,
    pub max_symbols: usize,
    pub max_paylines: usize,
    pub max_reels: u8,
    pub max_rows: u8,
    pub max_strip_length: usize,
    pub max_pay_value: f64,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_name_length: 256,
            max_symbols: 50,
            max_paylines: 100,
            max_reels: 10,
            max_rows: 10,
            max_strip_length: 1000,
            max_pay_value: 100_000.0,
        }
    }
}

impl ConfigParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON config
    pub fn parse_json(&self, json: &str) -> SlotResult<GameConfig> {
        let config: GameConfig = serde_json::from_str(json)?;
        self.validate(&config)?;
        Ok(config)
    }

    /// Parse a YAML config
    pub fn parse_yaml(&self, yaml: &str) -> SlotResult<GameConfig> {
        let config: GameConfig = serde_yml::from_str(yaml)?;
        self.validate(&config)?;
        Ok(config)
    }

    /// Load a config file, picking the format from its extension
    pub fn from_path(&self, path: impl AsRef<Path>) -> SlotResult<GameConfig> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        log::debug!("Loading game config from {}", path.display());

        match extension.as_deref() {
            Some("json") => self.parse_json(&text),
            Some("yaml") | Some("yml") => self.parse_yaml(&text),
            other => Err(SlotError::config(format!(
                "unsupported config format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    /// Check size limits, then full semantic validation
    pub fn validate(&self, config: &GameConfig) -> SlotResult<()> {
        let limits = &self.limits;

        if config.name.len() > limits.max_name_length {
            return Err(SlotError::config(format!(
                "Game name too long: {} > {}",
                config.name.len(),
                limits.max_name_length
            )));
        }
        if config.symbols.len() > limits.max_symbols {
            return Err(SlotError::config(format!(
                "Too many symbols: {} > {}",
                config.symbols.len(),
                limits.max_symbols
            )));
        }
        if config.paylines.len() > limits.max_paylines {
            return Err(SlotError::config(format!(
                "Too many paylines: {} > {}",
                config.paylines.len(),
                limits.max_paylines
            )));
        }
        if config.grid.reels > limits.max_reels {
            return Err(SlotError::config(format!(
                "Too many reels: {} > {}",
                config.grid.reels, limits.max_reels
            )));
        }
        if config.grid.rows > limits.max_rows {
            return Err(SlotError::config(format!(
                "Too many rows: {} > {}",
                config.grid.rows, limits.max_rows
            )));
        }
        if config.strip_length > limits.max_strip_length {
            return Err(SlotError::config(format!(
                "Reel strip too long: {} > {}",
                config.strip_length, limits.max_strip_length
            )));
        }
        if let Some(symbol) = config
            .symbols
            .symbols
            .iter()
            .find(|s| s.payout_value > limits.max_pay_value)
        {
            return Err(SlotError::config(format!(
                "Symbol {} pays {} > {}",
                symbol.name, symbol.payout_value, limits.max_pay_value
            )));
        }

        config.validate()
    }
}
