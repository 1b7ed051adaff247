//! Timing profiles for reel animation hand-off and spin pacing

use serde::{Deserialize, Serialize};

/// Timing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Normal gameplay timing
    #[default]
    Normal,
    /// Fast/Turbo mode
    Turbo,
    /// No animation wait (headless runs and tests)
    Instant,
    /// Custom timing
    Custom,
}

/// Detailed timing configuration (milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Profile type
    pub profile: TimingProfile,

    /// Spin time of the first reel (ms)
    pub reel_spin_duration_ms: f64,

    /// Extra spin time for each following reel (ms)
    pub reel_stop_stagger_ms: f64,

    /// Pause between a settled spin and the next auto or free spin (ms)
    pub auto_spin_delay_ms: f64,

    /// How long a win stays on screen (ms)
    pub win_display_ms: f64,

    /// Grace period on top of the full reveal before a reveal is forced complete (ms)
    pub reveal_timeout_grace_ms: f64,
}

impl TimingConfig {
    /// Normal gameplay timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            reel_spin_duration_ms: 2000.0,
            reel_stop_stagger_ms: 300.0,
            auto_spin_delay_ms: 1000.0,
            win_display_ms: 3000.0,
            reveal_timeout_grace_ms: 2000.0,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            reel_spin_duration_ms: 800.0,
            reel_stop_stagger_ms: 100.0,
            auto_spin_delay_ms: 400.0,
            win_display_ms: 1500.0,
            reveal_timeout_grace_ms: 1000.0,
        }
    }

    /// Instant mode
    pub fn instant() -> Self {
        Self {
            profile: TimingProfile::Instant,
            reel_spin_duration_ms: 0.0,
            reel_stop_stagger_ms: 0.0,
            auto_spin_delay_ms: 0.0,
            win_display_ms: 0.0,
            reveal_timeout_grace_ms: 0.0,
        }
    }

    /// Get config for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Instant => Self::instant(),
            TimingProfile::Custom => Self::normal(),
        }
    }

    /// When a single reel stops, measured from spin start
    pub fn reel_stop_at(&self, reel_index: u8) -> f64 {
        self.reel_spin_duration_ms + reel_index as f64 * self.reel_stop_stagger_ms
    }

    /// Calculate total spin duration (all reels stopping)
    pub fn total_spin_duration(&self, reel_count: u8) -> f64 {
        self.reel_stop_at(reel_count.saturating_sub(1))
    }

    /// Longest wait for the renderer before the reveal is forced complete
    pub fn reveal_timeout(&self, reel_count: u8) -> f64 {
        self.total_spin_duration(reel_count) + self.reveal_timeout_grace_ms
    }

    /// Per-reel stop times handed to the renderer
    pub fn reveal_hint(&self, reel_count: u8) -> RevealTiming {
        RevealTiming {
            reel_stop_ms: (0..reel_count).map(|r| self.reel_stop_at(r)).collect(),
            total_ms: self.total_spin_duration(reel_count),
            win_display_ms: self.win_display_ms,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::normal()
    }
}

/// Timing hint passed along with a grid to reveal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealTiming {
    /// Stop time of each reel from spin start (ms)
    pub reel_stop_ms: Vec<f64>,
    /// Time until the last reel stops (ms)
    pub total_ms: f64,
    /// How long winning lines stay highlighted (ms)
    pub win_display_ms: f64,
}
