//! Neon Reels headless player
//!
//! Usage:
//!   nr-play --spins 200 --seed 7           - Play 200 manual spins
//!   nr-play --auto --profile turbo         - Auto-spin until the spin count or the balance runs out
//!   nr-play --config game.yaml --json      - Custom game, JSON summary on stdout
//!
//! Set `RUST_LOG=debug` to follow every phase transition.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};

use nr_slot::{
    AudioCue, AudioPlayer, ConfigParser, GameConfig, GameState, Grid, LineWin, NoticeCategory,
    Notifier, Renderer, RevealMode, RevealTiming, SlotMachine, SpinReport, TimingConfig,
    TimingProfile,
};

#[derive(Parser)]
#[command(name = "nr-play", about = "Play a headless Neon Reels session")]
struct Cli {
    /// Game config file (.json, .yaml or .yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RNG seed for a reproducible session
    #[arg(short, long)]
    seed: Option<u64>,

    /// Spins to play, free spins included
    #[arg(short = 'n', long, default_value_t = 100)]
    spins: u64,

    /// Bet per paid spin
    #[arg(short, long)]
    bet: Option<f64>,

    /// Enable auto-spin
    #[arg(short, long)]
    auto: bool,

    /// Timing profile; overrides the config file's timing when given
    #[arg(short, long, value_enum)]
    profile: Option<Profile>,

    /// Print the session summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    Normal,
    Turbo,
    Instant,
}

impl From<Profile> for TimingProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Normal => TimingProfile::Normal,
            Profile::Turbo => TimingProfile::Turbo,
            Profile::Instant => TimingProfile::Instant,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOGGING COLLABORATORS
// ═══════════════════════════════════════════════════════════════════════════════

struct LogRenderer;

impl Renderer for LogRenderer {
    fn reveal_grid(&mut self, spin_id: u64, grid: &Grid, timing: &RevealTiming) -> RevealMode {
        log::debug!(
            "Spin {spin_id}: reels stop over {} ms, wins shown for {} ms",
            timing.total_ms,
            timing.win_display_ms
        );
        for row in 0..grid.rows() {
            let cells: Vec<String> = (0..grid.reels())
                .filter_map(|reel| grid.symbol_at(reel, row))
                .map(|id| format!("{id:>3}"))
                .collect();
            log::debug!("  |{}|", cells.join(" "));
        }
        RevealMode::Immediate
    }

    fn highlight_winning_lines(&mut self, lines: &[LineWin]) {
        for line in lines {
            log::info!(
                "Line {}: {} x{} pays {}",
                line.line_index,
                line.symbol_name,
                line.match_count,
                line.win_amount
            );
        }
    }

    fn clear_highlights(&mut self) {}

    fn update_display(&mut self, state: &GameState) {
        log::trace!(
            "Balance {} | Bet {} | Free spins {} | Jackpot {}",
            state.balance,
            state.bet_amount,
            state.free_spins_remaining,
            state.jackpot_pool
        );
        if state.multiplier_active() {
            log::trace!(
                "Multiplier x{} for {} more spins",
                state.win_multiplier,
                state.multiplier_spins_remaining
            );
        }
    }
}

struct LogAudio;

impl AudioPlayer for LogAudio {
    fn play(&mut self, cue: AudioCue) {
        log::trace!("Audio cue: {}", cue.name());
    }
}

struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, message: &str, category: NoticeCategory) {
        match category {
            NoticeCategory::Error => log::warn!("[{category:?}] {message}"),
            _ => log::info!("[{category:?}] {message}"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SESSION
// ═══════════════════════════════════════════════════════════════════════════════

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ConfigParser::new()
            .from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(profile) = cli.profile {
        config.timing = TimingConfig::from_profile(profile.into());
    }

    let machine = match cli.seed {
        Some(seed) => SlotMachine::with_seed(config, seed),
        None => SlotMachine::new(config),
    }
    .context("Invalid game configuration")?;

    let mut machine = machine
        .with_renderer(LogRenderer)
        .with_audio(LogAudio)
        .with_notifier(LogNotifier);

    if let Some(bet) = cli.bet {
        let delta = bet - machine.state().bet_amount;
        machine
            .change_bet(delta)
            .with_context(|| format!("Bet {bet} not allowed"))?;
    }
    if cli.auto {
        machine.toggle_auto_spin();
    }

    log::info!(
        "Starting session: balance {}, bet {}",
        machine.state().balance,
        machine.state().bet_amount
    );

    play(&mut machine, cli.spins)?;
    print_summary(&machine, cli.json)
}

fn play(machine: &mut SlotMachine, spins: u64) -> Result<()> {
    while machine.stats().total_spins < spins {
        let reports = match machine.scheduled() {
            Some(next) => machine.advance(next.due_ms - machine.clock_ms()),
            None => match machine.request_spin() {
                Ok(request) => request.into_report().into_iter().collect(),
                Err(e) if e.is_rejection() => {
                    log::warn!("Session over: {e}");
                    break;
                }
                Err(e) => return Err(e).context("Spin failed"),
            },
        };
        reports.iter().for_each(log_report);
    }
    Ok(())
}

fn log_report(report: &SpinReport) {
    let kind = if report.free_spin { "free" } else { "paid" };
    log::info!(
        "Spin {} ({kind}): won {} on {} wins (x{}), balance {}",
        report.spin_id,
        report.credited,
        report.outcome.win_count(),
        report.multiplier_applied,
        report.balance_after
    );
}

fn print_summary(machine: &SlotMachine, json: bool) -> Result<()> {
    let state = machine.state();
    let stats = machine.stats();

    if json {
        let summary = serde_json::json!({
            "balance": state.balance,
            "bet": state.bet_amount,
            "jackpot_pool": state.jackpot_pool,
            "free_spins_remaining": state.free_spins_remaining,
            "stats": stats,
            "rtp": stats.rtp(),
            "hit_rate": stats.hit_rate(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if stats.total_spins == 0 {
        bail!("No spins were played (balance {})", state.balance);
    }

    println!("Final balance: {:.2}", state.balance);
    println!("Jackpot pool:  {:.2}", state.jackpot_pool);
    println!(
        "Spins: {} ({} free) | Wins: {} | Losses: {}",
        stats.total_spins, stats.free_spins, stats.wins, stats.losses
    );
    println!(
        "Bet: {:.2} | Won: {:.2} | RTP: {:.2}% | Hit rate: {:.2}%",
        stats.total_bet,
        stats.total_win,
        stats.rtp(),
        stats.hit_rate()
    );
    println!(
        "Big wins: {} | Features: {} | Jackpots: {} | Best win: {:.1}x bet",
        stats.big_wins, stats.features_triggered, stats.jackpots_won, stats.max_win_ratio
    );
    Ok(())
}
