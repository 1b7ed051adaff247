//! Feature controller: win multiplier, free spins and the jackpot pool
//!
//! Applied once per settled spin, in this order:
//!
//! ```text
//! outcome.total_payout × win_multiplier   (credited payout)
//!     │
//!     ├── multiplier window counts down
//!     ├── jackpot check on the credited payout
//!     ├── scatter trigger → new multiplier roll
//!     └── scatter / bonus trigger → free spins award
//! ```

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::paytable::{SpinOutcome, tier_lookup};
use crate::state::GameState;

/// Win multiplier bonus configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiplierRules {
    /// Lowest multiplier rolled (inclusive)
    pub min: u32,
    /// Highest multiplier rolled (inclusive)
    pub max: u32,
    /// Settled spins the multiplier stays active
    pub duration_spins: u32,
}

impl Default for MultiplierRules {
    fn default() -> Self {
        Self {
            min: 2,
            max: 5,
            duration_spins: 5,
        }
    }
}

/// Progressive jackpot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JackpotConfig {
    /// Pool at session start; also the payout a round must reach to win it
    pub starting_pool: f64,
    /// Added to the pool after every jackpot win
    pub seed_increment: f64,
    /// Fraction of each paid bet fed into the pool
    pub contribution_rate: f64,
}

impl Default for JackpotConfig {
    fn default() -> Self {
        Self {
            starting_pool: 50_000.0,
            seed_increment: 10_000.0,
            contribution_rate: 0.01,
        }
    }
}

/// All feature rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureRules {
    /// Triggering symbol count → free spins awarded
    pub free_spins: BTreeMap<u8, u32>,
    pub multiplier: MultiplierRules,
    pub jackpot: JackpotConfig,
}

impl Default for FeatureRules {
    fn default() -> Self {
        Self {
            free_spins: BTreeMap::from([(3, 5), (4, 10), (5, 15)]),
            multiplier: MultiplierRules::default(),
            jackpot: JackpotConfig::default(),
        }
    }
}

impl FeatureRules {
    pub fn validate(&self) -> SlotResult<()> {
        if self.free_spins.is_empty() {
            return Err(SlotError::config("free spin table is empty"));
        }
        let m = &self.multiplier;
        if m.min < 1 || m.min > m.max {
            return Err(SlotError::config(format!(
                "multiplier range {}..={} is invalid",
                m.min, m.max
            )));
        }
        if m.duration_spins == 0 {
            return Err(SlotError::config("multiplier duration must be at least one spin"));
        }
        let j = &self.jackpot;
        for (name, value) in [
            ("starting pool", j.starting_pool),
            ("seed increment", j.seed_increment),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SlotError::config(format!("jackpot {name} is invalid: {value}")));
            }
        }
        if !(0.0..=1.0).contains(&j.contribution_rate) {
            return Err(SlotError::config(format!(
                "jackpot contribution rate must be within 0..=1, got {}",
                j.contribution_rate
            )));
        }
        Ok(())
    }
}

/// Which grid-wide symbol triggered a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Scatter,
    Bonus,
}

/// Free spins awarded by one spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeSpinAward {
    pub spins: u32,
    pub source: TriggerSource,
    pub symbol_count: u8,
}

/// Multiplier rolled by one spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierAward {
    pub multiplier: u32,
    pub spins: u32,
}

/// What the feature controller applied for one spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Multiplier in force for this spin's payout
    pub multiplier_applied: u32,
    /// Evaluated payout × multiplier
    pub credited_payout: f64,
    /// Jackpot paid on top, if won
    pub jackpot_award: Option<f64>,
    pub free_spins: Option<FreeSpinAward>,
    pub multiplier_award: Option<MultiplierAward>,
}

impl Settlement {
    /// Everything credited to the balance
    pub fn total_credit(&self) -> f64 {
        self.credited_payout + self.jackpot_award.unwrap_or(0.0)
    }

    pub fn jackpot_triggered(&self) -> bool {
        self.jackpot_award.is_some()
    }

    /// A bonus feature started this spin
    pub fn feature_triggered(&self) -> bool {
        self.free_spins.is_some() || self.multiplier_award.is_some()
    }
}

/// Applies feature rules to the session after each evaluated spin
#[derive(Debug, Clone)]
pub struct FeatureController {
    rules: FeatureRules,
}

impl FeatureController {
    pub fn new(rules: FeatureRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &FeatureRules {
        &self.rules
    }

    /// Feed part of a paid bet into the jackpot pool
    pub fn contribute(&self, state: &mut GameState, bet: f64) {
        state.jackpot_pool += bet * self.rules.jackpot.contribution_rate;
    }

    /// Apply multiplier, jackpot and triggers for one evaluated spin
    pub fn settle<R: Rng + ?Sized>(
        &self,
        state: &mut GameState,
        outcome: &SpinOutcome,
        rng: &mut R,
    ) -> Settlement {
        let multiplier_applied = state.win_multiplier.max(1);
        let credited_payout = outcome.total_payout * f64::from(multiplier_applied);

        self.tick_multiplier(state);

        let jackpot_award = self.check_jackpot(state, credited_payout);

        let multiplier_award = if outcome.triggers.multiplier_bonus {
            Some(self.roll_multiplier(state, rng))
        } else {
            None
        };

        let free_spins = self.free_spin_award(outcome);
        if let Some(award) = free_spins {
            state.free_spins_remaining = state.free_spins_remaining.saturating_add(award.spins);
            log::info!(
                "{} free spins awarded by {} {:?} symbols ({} remaining)",
                award.spins,
                award.symbol_count,
                award.source,
                state.free_spins_remaining
            );
        }

        Settlement {
            multiplier_applied,
            credited_payout,
            jackpot_award,
            free_spins,
            multiplier_award,
        }
    }

    fn tick_multiplier(&self, state: &mut GameState) {
        if state.multiplier_spins_remaining == 0 {
            return;
        }
        state.multiplier_spins_remaining -= 1;
        if state.multiplier_spins_remaining == 0 {
            log::debug!("Win multiplier x{} expired", state.win_multiplier);
            state.win_multiplier = 1;
        }
    }

    fn check_jackpot(&self, state: &mut GameState, credited_payout: f64) -> Option<f64> {
        if credited_payout <= 0.0 || credited_payout < state.jackpot_pool {
            return None;
        }
        let award = state.jackpot_pool;
        state.jackpot_pool += self.rules.jackpot.seed_increment;
        log::info!(
            "Jackpot of {award} won on a {credited_payout} payout, pool now {}",
            state.jackpot_pool
        );
        Some(award)
    }

    fn roll_multiplier<R: Rng + ?Sized>(&self, state: &mut GameState, rng: &mut R) -> MultiplierAward {
        let rules = &self.rules.multiplier;
        let multiplier = rng.random_range(rules.min..=rules.max);
        state.win_multiplier = multiplier;
        state.multiplier_spins_remaining = rules.duration_spins;
        log::info!("Win multiplier x{multiplier} active for {} spins", rules.duration_spins);
        MultiplierAward {
            multiplier,
            spins: rules.duration_spins,
        }
    }

    /// The larger of the scatter and bonus awards
    fn free_spin_award(&self, outcome: &SpinOutcome) -> Option<FreeSpinAward> {
        let scatter = outcome
            .triggers
            .scatter_free_spins
            .then(|| self.award_for(TriggerSource::Scatter, outcome.scatter_count))
            .flatten();
        let bonus = outcome
            .triggers
            .bonus_free_spins
            .then(|| self.award_for(TriggerSource::Bonus, outcome.bonus_count))
            .flatten();

        match (scatter, bonus) {
            (Some(s), Some(b)) => Some(if b.spins > s.spins { b } else { s }),
            (s, b) => s.or(b),
        }
    }

    fn award_for(&self, source: TriggerSource, symbol_count: u8) -> Option<FreeSpinAward> {
        tier_lookup(&self.rules.free_spins, symbol_count)
            .filter(|spins| *spins > 0)
            .map(|spins| FreeSpinAward {
                spins,
                source,
                symbol_count,
            })
    }
}

impl Default for FeatureController {
    fn default() -> Self {
        Self::new(FeatureRules::default())
    }
}
