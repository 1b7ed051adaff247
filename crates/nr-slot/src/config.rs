//! Game configuration

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::events::AudioTiers;
use crate::features::FeatureRules;
use crate::paytable::{
    Payline, PayoutRules, standard_20_paylines, tier_lookup, validate_paylines,
};
use crate::symbols::SymbolCatalog;
use crate::timing::TimingConfig;

/// Grid specification (reels × rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of reels (columns)
    pub reels: u8,
    /// Number of visible rows per reel
    pub rows: u8,
}

impl GridSpec {
    /// Standard 5×3
    pub fn standard_5x3() -> Self {
        Self { reels: 5, rows: 3 }
    }

    /// Total grid positions
    pub fn total_positions(&self) -> usize {
        self.reels as usize * self.rows as usize
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::standard_5x3()
    }
}

/// Bet bounds and the increment used by bet up/down
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BetLimits {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for BetLimits {
    fn default() -> Self {
        Self {
            min: 50.0,
            max: 1000.0,
            step: 50.0,
        }
    }
}

impl BetLimits {
    /// Accept `requested` if it is within bounds and, outside free spins, affordable
    pub fn check(&self, requested: f64, balance: f64, free_spins: bool) -> SlotResult<f64> {
        let affordable = free_spins || requested <= balance;
        if requested.is_finite() && requested >= self.min && requested <= self.max && affordable {
            Ok(requested)
        } else {
            Err(self.rejection(requested, balance))
        }
    }

    /// Largest step-aligned bet not above the maximum (or the balance, outside free spins)
    pub fn max_affordable(&self, balance: f64, free_spins: bool) -> Option<f64> {
        let cap = if free_spins {
            self.max
        } else {
            self.max.min(balance)
        };
        if cap < self.min {
            return None;
        }
        let steps = ((cap - self.min) / self.step).floor();
        Some((self.min + steps * self.step).min(self.max))
    }

    pub fn rejection(&self, requested: f64, balance: f64) -> SlotError {
        SlotError::InvalidBetAmount {
            requested,
            min: self.min,
            max: self.max,
            balance,
        }
    }

    pub fn validate(&self) -> SlotResult<()> {
        if !self.min.is_finite() || self.min <= 0.0 {
            return Err(SlotError::config(format!("minimum bet must be positive, got {}", self.min)));
        }
        if !self.max.is_finite() || self.max < self.min {
            return Err(SlotError::config(format!(
                "maximum bet {} is below minimum bet {}",
                self.max, self.min
            )));
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(SlotError::config(format!("bet step must be positive, got {}", self.step)));
        }
        Ok(())
    }
}

/// Complete game configuration, loaded once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub name: String,
    pub grid: GridSpec,
    /// Symbols per generated reel strip
    pub strip_length: usize,
    pub symbols: SymbolCatalog,
    pub paylines: Vec<Payline>,
    pub payout: PayoutRules,
    pub bet: BetLimits,
    pub starting_balance: f64,
    pub starting_bet: f64,
    pub features: FeatureRules,
    pub audio: AudioTiers,
    pub timing: TimingConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            name: "Neon Reels".into(),
            grid: GridSpec::default(),
            strip_length: 30,
            symbols: SymbolCatalog::cyberpunk(),
            paylines: standard_20_paylines(),
            payout: PayoutRules::default(),
            bet: BetLimits::default(),
            starting_balance: 10_000.0,
            starting_bet: 100.0,
            features: FeatureRules::default(),
            audio: AudioTiers::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl GameConfig {
    /// Builder: replace the timing
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Builder: replace the symbol catalog
    pub fn with_symbols(mut self, symbols: SymbolCatalog) -> Self {
        self.symbols = symbols;
        self
    }

    /// Builder: replace the paylines
    pub fn with_paylines(mut self, paylines: Vec<Payline>) -> Self {
        self.paylines = paylines;
        self
    }

    /// Check every table and bound; a machine is only built from a valid config
    pub fn validate(&self) -> SlotResult<()> {
        if self.grid.reels == 0 || self.grid.rows == 0 {
            return Err(SlotError::config(format!(
                "grid must have at least one reel and one row, got {}x{}",
                self.grid.reels, self.grid.rows
            )));
        }
        if self.strip_length < self.grid.rows as usize {
            return Err(SlotError::config(format!(
                "strip length {} is shorter than {} visible rows",
                self.strip_length, self.grid.rows
            )));
        }

        self.symbols.validate()?;
        validate_paylines(&self.paylines, self.grid.reels, self.grid.rows)?;
        self.payout.validate()?;
        self.bet.validate()?;
        self.features.validate()?;

        if !self.starting_balance.is_finite() || self.starting_balance < 0.0 {
            return Err(SlotError::config(format!(
                "starting balance is invalid: {}",
                self.starting_balance
            )));
        }
        if !self.starting_bet.is_finite()
            || self.starting_bet < self.bet.min
            || self.starting_bet > self.bet.max
        {
            return Err(SlotError::config(format!(
                "starting bet {} is outside {}..={}",
                self.starting_bet, self.bet.min, self.bet.max
            )));
        }

        for (trigger, count) in [
            ("scatter", self.payout.scatter_free_spins_count),
            ("bonus", self.payout.bonus_trigger_count),
        ] {
            if !tier_lookup(&self.features.free_spins, count).is_some_and(|spins| spins > 0) {
                return Err(SlotError::config(format!(
                    "free spin table has no award for {count} {trigger} symbols"
                )));
            }
        }

        if !(self.audio.medium.is_finite() && self.audio.big >= self.audio.medium) {
            return Err(SlotError::config("audio win tiers must satisfy medium <= big"));
        }

        let t = &self.timing;
        let durations = [
            t.reel_spin_duration_ms,
            t.reel_stop_stagger_ms,
            t.auto_spin_delay_ms,
            t.win_display_ms,
            t.reveal_timeout_grace_ms,
        ];
        if durations.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(SlotError::config("timing durations must be finite and non-negative"));
        }

        Ok(())
    }
}
