//! Presentation collaborators: renderer, audio and notifications
//!
//! The machine never draws, plays or shows anything itself. It reaches the
//! outside world only through these traits and treats every call as
//! fire-and-forget, except [`Renderer::reveal_grid`], which decides whether
//! the reveal completes at once or later through `complete_reveal`.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::paytable::LineWin;
use crate::state::GameState;
use crate::timing::RevealTiming;

// ═══════════════════════════════════════════════════════════════════════════════
// AUDIO
// ═══════════════════════════════════════════════════════════════════════════════

/// Sound cue requested from the audio player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Spin,
    /// A reel came to rest (reel index)
    ReelStop(u8),
    SmallWin,
    MediumWin,
    BigWin,
    Jackpot,
    BonusTriggered,
    FreeSpinsTriggered,
    Lose,
}

impl AudioCue {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Spin => "spin",
            Self::ReelStop(_) => "reel_stop",
            Self::SmallWin => "small_win",
            Self::MediumWin => "medium_win",
            Self::BigWin => "big_win",
            Self::Jackpot => "jackpot",
            Self::BonusTriggered => "bonus_triggered",
            Self::FreeSpinsTriggered => "free_spins_triggered",
            Self::Lose => "lose",
        }
    }
}

/// Win amount thresholds for the win sound (strictly above)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioTiers {
    pub medium: f64,
    pub big: f64,
}

impl Default for AudioTiers {
    fn default() -> Self {
        Self {
            medium: 100.0,
            big: 1000.0,
        }
    }
}

impl AudioTiers {
    /// Win sound for a credited amount; `Lose` for nothing
    pub fn cue_for(&self, amount: f64) -> AudioCue {
        if amount <= 0.0 {
            AudioCue::Lose
        } else if amount > self.big {
            AudioCue::BigWin
        } else if amount > self.medium {
            AudioCue::MediumWin
        } else {
            AudioCue::SmallWin
        }
    }

    pub fn is_big_win(&self, amount: f64) -> bool {
        amount > self.big
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NOTIFICATIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeCategory {
    Info,
    Error,
    Bonus,
    FreeSpin,
    Jackpot,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RENDERER
// ═══════════════════════════════════════════════════════════════════════════════

/// How a renderer answers a reveal request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealMode {
    /// Reveal is already complete; evaluation runs right away
    #[default]
    Immediate,
    /// Renderer will call back with `complete_reveal(spin_id)`
    Deferred,
}

pub trait Renderer {
    /// Show the reels stopping on `grid`
    fn reveal_grid(&mut self, spin_id: u64, grid: &Grid, timing: &RevealTiming) -> RevealMode;

    fn highlight_winning_lines(&mut self, lines: &[LineWin]);

    fn clear_highlights(&mut self);

    /// Refresh balance, bet and feature counters
    fn update_display(&mut self, _state: &GameState) {}
}

pub trait AudioPlayer {
    fn play(&mut self, cue: AudioCue);
}

pub trait Notifier {
    fn notify(&mut self, message: &str, category: NoticeCategory);
}

/// Renderer that completes every reveal immediately and draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn reveal_grid(&mut self, _spin_id: u64, _grid: &Grid, _timing: &RevealTiming) -> RevealMode {
        RevealMode::Immediate
    }

    fn highlight_winning_lines(&mut self, _lines: &[LineWin]) {}

    fn clear_highlights(&mut self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioPlayer for NullAudio {
    fn play(&mut self, _cue: AudioCue) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&mut self, _message: &str, _category: NoticeCategory) {}
}
