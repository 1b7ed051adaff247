//! Mutable session state owned by the slot machine

use serde::{Deserialize, Serialize};

/// Spin lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinPhase {
    /// Waiting for a spin request
    #[default]
    Idle,
    /// Reels are being revealed
    Spinning,
    /// Grid is being evaluated
    Evaluating,
    /// Payout and features are being applied
    Settling,
}

/// The session: balance, bet and feature state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub balance: f64,
    pub bet_amount: f64,
    pub phase: SpinPhase,
    pub auto_spin_enabled: bool,
    pub free_spins_remaining: u32,
    /// Always at least 1
    pub win_multiplier: u32,
    /// Settled spins left before the multiplier falls back to 1
    pub multiplier_spins_remaining: u32,
    pub jackpot_pool: f64,
    /// Most recent credited win, shown as "last win"
    pub last_win: f64,
}

impl GameState {
    pub fn new(balance: f64, bet_amount: f64, jackpot_pool: f64) -> Self {
        Self {
            balance,
            bet_amount,
            phase: SpinPhase::Idle,
            auto_spin_enabled: false,
            free_spins_remaining: 0,
            win_multiplier: 1,
            multiplier_spins_remaining: 0,
            jackpot_pool,
            last_win: 0.0,
        }
    }

    /// A spin is in flight (mutual exclusion, not a counter)
    pub fn is_spinning(&self) -> bool {
        self.phase != SpinPhase::Idle
    }

    pub fn in_free_spins(&self) -> bool {
        self.free_spins_remaining > 0
    }

    /// The next spin may start: free spins left, or enough balance for the bet
    pub fn can_afford_spin(&self) -> bool {
        self.in_free_spins() || self.balance >= self.bet_amount
    }

    pub fn multiplier_active(&self) -> bool {
        self.win_multiplier > 1 && self.multiplier_spins_remaining > 0
    }
}
