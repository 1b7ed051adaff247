//! Spin state machine
//!
//! ```text
//! Idle ──request_spin──▶ Spinning ──reveal complete──▶ Evaluating ──▶ Settling ──▶ Idle
//!                          │  ▲                                                     │
//!                          │  └── complete_reveal(id) / reveal timeout              │
//!                          └── Renderer::reveal_grid                                │
//!                                                                                   ▼
//!                                                     SpinScheduler (next free / auto spin)
//! ```
//!
//! Chained spins never recurse: settling only puts the next spin on the
//! scheduler, and [`SlotMachine::advance`] fires due events in a loop.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::{SlotError, SlotResult};
use crate::events::{
    AudioCue, AudioPlayer, NoticeCategory, Notifier, NullAudio, NullNotifier, NullRenderer,
    Renderer, RevealMode,
};
use crate::features::{FeatureController, FreeSpinAward, MultiplierAward, Settlement};
use crate::grid::{Grid, sample_grid};
use crate::paytable::{PayTable, SpinOutcome};
use crate::reels::{ReelStrip, generate_strips};
use crate::scheduler::{ScheduledKind, ScheduledSpin, SpinScheduler};
use crate::state::{GameState, SpinPhase};
use crate::stats::SessionStats;

/// Chained spins are at least this far apart on the virtual clock (ms)
const MIN_CHAIN_DELAY_MS: f64 = 1.0;

/// Everything that happened in one settled spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinReport {
    pub spin_id: u64,
    pub grid: Grid,
    pub outcome: SpinOutcome,
    /// Bet the spin was evaluated with
    pub bet: f64,
    /// Taken from the balance (0 for a free spin)
    pub debited: f64,
    pub free_spin: bool,
    /// Multiplier in force for this spin
    pub multiplier_applied: u32,
    /// Total added to the balance, jackpot included
    pub credited: f64,
    pub jackpot_award: Option<f64>,
    pub jackpot_triggered: bool,
    pub free_spins_awarded: Option<FreeSpinAward>,
    pub multiplier_awarded: Option<MultiplierAward>,
    /// Reveal was forced complete by the timeout
    pub reveal_timed_out: bool,
    pub balance_after: f64,
}

impl SpinReport {
    /// Credited amount over the bet
    pub fn win_ratio(&self) -> f64 {
        if self.bet > 0.0 {
            self.credited / self.bet
        } else {
            0.0
        }
    }

    pub fn feature_triggered(&self) -> bool {
        self.free_spins_awarded.is_some() || self.multiplier_awarded.is_some()
    }
}

/// Result of a spin request
#[derive(Debug, Clone, PartialEq)]
pub enum SpinRequest {
    /// A spin is already in flight; nothing changed
    Ignored,
    /// Spin started; waiting for `complete_reveal(spin_id)`
    Pending { spin_id: u64 },
    /// Renderer revealed immediately and the spin settled
    Settled(Box<SpinReport>),
}

impl SpinRequest {
    pub fn report(&self) -> Option<&SpinReport> {
        match self {
            Self::Settled(report) => Some(report),
            _ => None,
        }
    }

    pub fn into_report(self) -> Option<SpinReport> {
        match self {
            Self::Settled(report) => Some(*report),
            _ => None,
        }
    }
}

/// A spin between `Idle → Spinning` and the end of its reveal
#[derive(Debug, Clone)]
struct InFlightSpin {
    spin_id: u64,
    grid: Grid,
    bet: f64,
    debited: f64,
    free_spin: bool,
    /// Virtual time the reveal is forced complete
    deadline_ms: f64,
}

/// The slot machine: owns the session and drives every spin
pub struct SlotMachine {
    config: GameConfig,
    paytable: PayTable,
    features: FeatureController,
    strips: Vec<ReelStrip>,
    rng: ChaCha8Rng,
    state: GameState,
    stats: SessionStats,
    scheduler: SpinScheduler,
    clock_ms: f64,
    next_spin_id: u64,
    in_flight: Option<InFlightSpin>,
    forced_grid: Option<Grid>,
    renderer: Box<dyn Renderer>,
    audio: Box<dyn AudioPlayer>,
    notifier: Box<dyn Notifier>,
}

impl std::fmt::Debug for SlotMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotMachine")
            .field("name", &self.config.name)
            .field("state", &self.state)
            .field("clock_ms", &self.clock_ms)
            .field("scheduled", &self.scheduler.pending())
            .finish_non_exhaustive()
    }
}

impl SlotMachine {
    /// Create a machine seeded from the OS
    pub fn new(config: GameConfig) -> SlotResult<Self> {
        Self::with_rng(config, ChaCha8Rng::from_os_rng())
    }

    /// Create a machine with a fixed seed (reproducible sessions)
    pub fn with_seed(config: GameConfig, seed: u64) -> SlotResult<Self> {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, mut rng: ChaCha8Rng) -> SlotResult<Self> {
        config.validate()?;

        let strips = generate_strips(
            &config.symbols,
            config.grid.reels,
            config.strip_length,
            &mut rng,
        )?;
        let paytable = PayTable::new(
            config.symbols.clone(),
            config.paylines.clone(),
            config.payout.clone(),
        );
        let features = FeatureController::new(config.features.clone());
        let state = GameState::new(
            config.starting_balance,
            config.starting_bet,
            config.features.jackpot.starting_pool,
        );

        log::info!(
            "Slot machine '{}' ready: {}x{} grid, {} paylines, {} symbols",
            config.name,
            config.grid.reels,
            config.grid.rows,
            config.paylines.len(),
            config.symbols.len()
        );

        Ok(Self {
            config,
            paytable,
            features,
            strips,
            rng,
            state,
            stats: SessionStats::default(),
            scheduler: SpinScheduler::new(),
            clock_ms: 0.0,
            next_spin_id: 1,
            in_flight: None,
            forced_grid: None,
            renderer: Box::new(NullRenderer),
            audio: Box::new(NullAudio),
            notifier: Box::new(NullNotifier),
        })
    }

    /// Builder: attach a renderer
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Builder: attach an audio player
    pub fn with_audio(mut self, audio: impl AudioPlayer + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    /// Builder: attach a notifier
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn paytable(&self) -> &PayTable {
        &self.paytable
    }

    pub fn strips(&self) -> &[ReelStrip] {
        &self.strips
    }

    /// Virtual clock (ms)
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Spin waiting for its reveal, if any
    pub fn pending_spin_id(&self) -> Option<u64> {
        self.in_flight.as_ref().map(|s| s.spin_id)
    }

    /// Next chained spin, if any
    pub fn scheduled(&self) -> Option<ScheduledSpin> {
        self.scheduler.pending()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPINNING
    // ═══════════════════════════════════════════════════════════════════════════

    /// Start a spin. A no-op while another spin is in flight.
    pub fn request_spin(&mut self) -> SlotResult<SpinRequest> {
        if self.state.is_spinning() {
            log::debug!("Spin request ignored: phase is {:?}", self.state.phase);
            return Ok(SpinRequest::Ignored);
        }
        // A manual spin takes the place of a chained one
        self.scheduler.cancel();
        self.start_spin()
    }

    /// Renderer callback: the reels for `spin_id` have stopped.
    /// Stale or unknown ids are ignored.
    pub fn complete_reveal(&mut self, spin_id: u64) -> Option<SpinReport> {
        match self.in_flight.take() {
            Some(spin) if spin.spin_id == spin_id => Some(self.finish_spin(spin, false)),
            other => {
                log::debug!("Ignoring reveal completion for spin {spin_id}");
                self.in_flight = other;
                None
            }
        }
    }

    /// Move the virtual clock forward, firing reveal timeouts and chained spins
    /// that fall due. Returns every spin settled along the way, in order.
    pub fn advance(&mut self, elapsed_ms: f64) -> Vec<SpinReport> {
        let target = self.clock_ms + elapsed_ms.max(0.0);
        let mut reports = Vec::new();

        loop {
            let reveal_due = self.in_flight.as_ref().map(|s| s.deadline_ms);
            // Chained spins wait until nothing is in flight
            let chain_due = match reveal_due {
                Some(_) => None,
                None => self.scheduler.next_due(),
            };

            let Some(due) = reveal_due.or(chain_due).filter(|due| *due <= target) else {
                break;
            };
            self.clock_ms = self.clock_ms.max(due);

            if let Some(spin) = self.in_flight.take() {
                log::warn!(
                    "Reveal of spin {} timed out at {} ms, forcing completion",
                    spin.spin_id,
                    self.clock_ms
                );
                reports.push(self.finish_spin(spin, true));
                continue;
            }

            if let Some(scheduled) = self.scheduler.take_due(self.clock_ms) {
                if let Some(report) = self.fire_scheduled(scheduled) {
                    reports.push(report);
                }
            }
        }

        self.clock_ms = target;
        reports
    }

    fn fire_scheduled(&mut self, scheduled: ScheduledSpin) -> Option<SpinReport> {
        let still_wanted = match scheduled.kind {
            ScheduledKind::Free => self.state.in_free_spins(),
            ScheduledKind::Auto => self.state.auto_spin_enabled,
        };
        if !still_wanted || self.state.is_spinning() {
            log::debug!("Dropping stale {:?} spin", scheduled.kind);
            return None;
        }

        match self.start_spin() {
            Ok(request) => request.into_report(),
            Err(e) => {
                if self.state.auto_spin_enabled {
                    self.stop_auto_spin("insufficient balance");
                }
                log::warn!("Chained spin rejected: {e}");
                None
            }
        }
    }

    /// `Idle → Spinning`
    fn start_spin(&mut self) -> SlotResult<SpinRequest> {
        let free_spin = self.state.in_free_spins();
        let bet = self.state.bet_amount;

        if !free_spin && self.state.balance < bet {
            self.notifier.notify(
                "Insufficient balance for this bet",
                NoticeCategory::Error,
            );
            return Err(SlotError::InsufficientFunds {
                balance: self.state.balance,
                bet,
            });
        }

        let grid = match self.forced_grid.take() {
            Some(grid) => grid,
            None => sample_grid(&self.strips, self.config.grid.rows as usize, &mut self.rng)?,
        };

        let debited = if free_spin { 0.0 } else { bet };
        self.state.balance -= debited;
        if !free_spin {
            self.features.contribute(&mut self.state, bet);
        }

        let spin_id = self.next_spin_id;
        self.next_spin_id += 1;
        self.state.phase = SpinPhase::Spinning;
        log::debug!(
            "Spin {spin_id}: Idle -> Spinning (bet {bet}, {})",
            if free_spin { "free" } else { "paid" }
        );

        self.renderer.clear_highlights();
        self.audio.play(AudioCue::Spin);
        self.renderer.update_display(&self.state);

        let reels = self.config.grid.reels;
        let timing = self.config.timing.reveal_hint(reels);
        let deadline_ms = self.clock_ms + self.config.timing.reveal_timeout(reels);
        let mode = self.renderer.reveal_grid(spin_id, &grid, &timing);

        let spin = InFlightSpin {
            spin_id,
            grid,
            bet,
            debited,
            free_spin,
            deadline_ms,
        };

        Ok(match mode {
            RevealMode::Immediate => SpinRequest::Settled(Box::new(self.finish_spin(spin, false))),
            RevealMode::Deferred => {
                self.in_flight = Some(spin);
                SpinRequest::Pending { spin_id }
            }
        })
    }

    /// `Spinning → Evaluating → Settling → Idle`
    fn finish_spin(&mut self, spin: InFlightSpin, reveal_timed_out: bool) -> SpinReport {
        self.state.phase = SpinPhase::Evaluating;
        log::debug!("Spin {}: Spinning -> Evaluating", spin.spin_id);

        for reel in 0..self.config.grid.reels {
            self.audio.play(AudioCue::ReelStop(reel));
        }
        let outcome = self.paytable.evaluate(&spin.grid, spin.bet);

        self.state.phase = SpinPhase::Settling;
        log::debug!(
            "Spin {}: Evaluating -> Settling (payout {})",
            spin.spin_id,
            outcome.total_payout
        );

        if spin.free_spin {
            self.state.free_spins_remaining = self.state.free_spins_remaining.saturating_sub(1);
        }
        let settlement = self.features.settle(&mut self.state, &outcome, &mut self.rng);
        let credited = settlement.total_credit();
        self.state.balance += credited;
        self.state.last_win = credited;

        self.present(&outcome, &settlement);

        let big_win = self.config.audio.is_big_win(credited);
        let report = SpinReport {
            spin_id: spin.spin_id,
            grid: spin.grid,
            outcome,
            bet: spin.bet,
            debited: spin.debited,
            free_spin: spin.free_spin,
            multiplier_applied: settlement.multiplier_applied,
            credited,
            jackpot_award: settlement.jackpot_award,
            jackpot_triggered: settlement.jackpot_triggered(),
            free_spins_awarded: settlement.free_spins,
            multiplier_awarded: settlement.multiplier_award,
            reveal_timed_out,
            balance_after: self.state.balance,
        };
        self.stats.record(&report, big_win);

        self.state.phase = SpinPhase::Idle;
        log::debug!("Spin {}: Settling -> Idle (balance {})", report.spin_id, self.state.balance);
        self.renderer.update_display(&self.state);

        self.schedule_next();
        report
    }

    /// Highlights, sounds and notices for a settled spin
    fn present(&mut self, outcome: &SpinOutcome, settlement: &Settlement) {
        if !outcome.winning_lines.is_empty() {
            self.renderer.highlight_winning_lines(&outcome.winning_lines);
        }

        match settlement.jackpot_award {
            Some(award) => {
                self.audio.play(AudioCue::Jackpot);
                self.notifier
                    .notify(&format!("JACKPOT! {award:.0} credits"), NoticeCategory::Jackpot);
            }
            None => {
                let cue = self.config.audio.cue_for(settlement.total_credit());
                self.audio.play(cue);
            }
        }

        if let Some(award) = settlement.multiplier_award {
            self.audio.play(AudioCue::BonusTriggered);
            self.notifier.notify(
                &format!("x{} win multiplier for {} spins", award.multiplier, award.spins),
                NoticeCategory::Bonus,
            );
        }
        if let Some(award) = settlement.free_spins {
            self.audio.play(AudioCue::FreeSpinsTriggered);
            self.notifier.notify(
                &format!("{} free spins awarded", award.spins),
                NoticeCategory::FreeSpin,
            );
        }
    }

    /// `Settling → Idle`: queue the next free or auto spin
    fn schedule_next(&mut self) {
        let due = self.clock_ms + self.config.timing.auto_spin_delay_ms.max(MIN_CHAIN_DELAY_MS);

        if self.state.in_free_spins() {
            self.scheduler.schedule(due, ScheduledKind::Free);
        } else if self.state.auto_spin_enabled {
            if self.state.can_afford_spin() {
                self.scheduler.schedule(due, ScheduledKind::Auto);
            } else {
                self.stop_auto_spin("insufficient balance");
            }
        }
    }

    fn stop_auto_spin(&mut self, reason: &str) {
        self.state.auto_spin_enabled = false;
        self.scheduler.cancel_kind(ScheduledKind::Auto);
        log::warn!("Auto-spin stopped: {reason}");
        self.notifier
            .notify(&format!("Auto-spin stopped: {reason}"), NoticeCategory::Info);
        self.renderer.update_display(&self.state);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INPUT COMMANDS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Change the bet by `delta`. Out-of-range or unaffordable bets are rejected unchanged.
    pub fn change_bet(&mut self, delta: f64) -> SlotResult<f64> {
        let requested = self.state.bet_amount + delta;
        let bet = self.config.bet.check(
            requested,
            self.state.balance,
            self.state.in_free_spins(),
        )?;
        self.set_bet(bet);
        Ok(bet)
    }

    pub fn increase_bet(&mut self) -> SlotResult<f64> {
        self.change_bet(self.config.bet.step)
    }

    pub fn decrease_bet(&mut self) -> SlotResult<f64> {
        self.change_bet(-self.config.bet.step)
    }

    /// Highest bet the limits and balance allow
    pub fn set_max_bet(&mut self) -> SlotResult<f64> {
        let limits = &self.config.bet;
        let bet = limits
            .max_affordable(self.state.balance, self.state.in_free_spins())
            .ok_or_else(|| limits.rejection(limits.max, self.state.balance))?;
        self.set_bet(bet);
        Ok(bet)
    }

    fn set_bet(&mut self, bet: f64) {
        log::debug!("Bet changed {} -> {bet}", self.state.bet_amount);
        self.state.bet_amount = bet;
        self.renderer.update_display(&self.state);
    }

    /// Flip auto-spin. Switching off cancels a queued auto spin; free spins keep chaining.
    pub fn toggle_auto_spin(&mut self) -> bool {
        self.state.auto_spin_enabled = !self.state.auto_spin_enabled;
        if self.state.auto_spin_enabled {
            log::info!("Auto-spin enabled");
        } else {
            self.scheduler.cancel_kind(ScheduledKind::Auto);
            log::info!("Auto-spin disabled");
        }
        self.renderer.update_display(&self.state);
        self.state.auto_spin_enabled
    }

    /// Regenerate every reel strip from the catalog
    pub fn rebuild_reels(&mut self) -> SlotResult<()> {
        self.strips = generate_strips(
            &self.config.symbols,
            self.config.grid.reels,
            self.config.strip_length,
            &mut self.rng,
        )?;
        log::debug!("Rebuilt {} reel strips", self.strips.len());
        Ok(())
    }

    /// Use `grid` instead of a sampled grid for the next spin
    pub fn force_next_grid(&mut self, grid: Grid) -> SlotResult<()> {
        let spec = self.config.grid;
        if grid.reels() != spec.reels as usize || grid.rows() != spec.rows as usize {
            return Err(SlotError::InvalidGrid(format!(
                "expected {}x{}, got {}x{}",
                spec.reels,
                spec.rows,
                grid.reels(),
                grid.rows()
            )));
        }
        grid.check_symbols(&self.config.symbols)?;
        self.forced_grid = Some(grid);
        Ok(())
    }
}
