//! Session Test Suite
//!
//! Drives a full `SlotMachine` through its public commands:
//! - Paid and free spin accounting
//! - Deferred reveals, stale callbacks and reveal timeouts
//! - Auto-spin and free-spin chaining on the virtual clock
//! - Bet commands and rejections
//! - Multiplier and jackpot settlement
//! - Collaborator calls (audio cues, notices, highlights)

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use nr_slot::{
    AudioCue, AudioPlayer, GameConfig, Grid, LineWin, NoticeCategory, Notifier, Renderer,
    RevealMode, RevealTiming, ScheduledKind, SlotError, SlotMachine, SpinPhase, SpinReport,
    SpinRequest, Symbol, SymbolCatalog, TimingConfig, straight_paylines,
};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

const SEVEN: u32 = 1;
const BAR: u32 = 2;
const WILD: u32 = 9;
const SCATTER: u32 = 10;
const BONUS: u32 = 11;

#[derive(Default)]
struct Recorded {
    cues: Vec<AudioCue>,
    notices: Vec<(String, NoticeCategory)>,
    reveals: Vec<u64>,
    highlighted: Vec<u8>,
    clears: usize,
}

type Shared = Rc<RefCell<Recorded>>;

struct RecordingRenderer {
    log: Shared,
    mode: RevealMode,
}

impl Renderer for RecordingRenderer {
    fn reveal_grid(&mut self, spin_id: u64, _grid: &Grid, _timing: &RevealTiming) -> RevealMode {
        self.log.borrow_mut().reveals.push(spin_id);
        self.mode
    }

    fn highlight_winning_lines(&mut self, lines: &[LineWin]) {
        self.log
            .borrow_mut()
            .highlighted
            .extend(lines.iter().map(|l| l.line_index));
    }

    fn clear_highlights(&mut self) {
        self.log.borrow_mut().clears += 1;
    }
}

struct RecordingAudio(Shared);

impl AudioPlayer for RecordingAudio {
    fn play(&mut self, cue: AudioCue) {
        self.0.borrow_mut().cues.push(cue);
    }
}

struct RecordingNotifier(Shared);

impl Notifier for RecordingNotifier {
    fn notify(&mut self, message: &str, category: NoticeCategory) {
        self.0.borrow_mut().notices.push((message.to_string(), category));
    }
}

/// Default game on the three straight lines, "7" paying 100, instant timing
fn test_config() -> GameConfig {
    let mut config = GameConfig::default()
        .with_paylines(straight_paylines(3, 5))
        .with_timing(TimingConfig::instant());
    config.symbols.symbols[0].payout_value = 100.0;
    config
}

/// A catalog nothing on the grid can ever pay from
fn losing_config() -> GameConfig {
    GameConfig::default()
        .with_symbols(SymbolCatalog::new(vec![
            Symbol::normal(1, "A", 0.0, 1.0),
            Symbol::normal(2, "B", 0.0, 1.0),
        ]))
        .with_timing(TimingConfig::instant())
}

fn recording_machine(config: GameConfig, mode: RevealMode) -> (SlotMachine, Shared) {
    let log = Shared::default();
    let machine = SlotMachine::with_seed(config, 7)
        .unwrap()
        .with_renderer(RecordingRenderer {
            log: log.clone(),
            mode,
        })
        .with_audio(RecordingAudio(log.clone()))
        .with_notifier(RecordingNotifier(log.clone()));
    (machine, log)
}

/// Middle line `[7, 7, 7, Wild, BAR]`, nothing else pays
fn middle_line_grid() -> Grid {
    Grid::from_rows(vec![
        vec![3, 4, 5, 6, 7],
        vec![SEVEN, SEVEN, SEVEN, WILD, BAR],
        vec![4, 5, 6, 7, 8],
    ])
    .unwrap()
}

fn losing_grid() -> Grid {
    Grid::from_rows(vec![
        vec![1, 2, 3, 4, 5],
        vec![6, 7, 8, 1, 2],
        vec![3, 4, 5, 6, 7],
    ])
    .unwrap()
}

fn three_scatter_grid() -> Grid {
    Grid::from_rows(vec![
        vec![SCATTER, 2, 3, 4, 5],
        vec![6, SCATTER, 8, 1, 2],
        vec![3, 4, SCATTER, 6, 7],
    ])
    .unwrap()
}

fn three_bonus_grid() -> Grid {
    Grid::from_rows(vec![
        vec![BONUS, 2, 3, 4, 5],
        vec![6, BONUS, 8, 1, 2],
        vec![3, 4, BONUS, 6, 7],
    ])
    .unwrap()
}

fn settled(request: SpinRequest) -> SpinReport {
    request.into_report().expect("spin should settle immediately")
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPIN ACCOUNTING
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_end_to_end_middle_line_payout() {
    let (mut machine, log) = recording_machine(test_config(), RevealMode::Immediate);
    machine.force_next_grid(middle_line_grid()).unwrap();

    let report = settled(machine.request_spin().unwrap());

    assert_eq!(report.outcome.winning_lines.len(), 1);
    let line = &report.outcome.winning_lines[0];
    assert_eq!(line.line_index, 1);
    assert_eq!(line.match_count, 4);
    assert_eq!(line.symbol_id, SEVEN);
    // 100 × 4 × 2 × 100 / 10
    assert_relative_eq!(report.credited, 8000.0);
    assert_relative_eq!(machine.state().balance, 17_900.0);
    assert_relative_eq!(report.balance_after, 17_900.0);
    assert!(!report.jackpot_triggered);
    assert_eq!(machine.state().phase, SpinPhase::Idle);

    let log = log.borrow();
    assert_eq!(log.highlighted, vec![1]);
    assert_eq!(log.clears, 1);
    assert_eq!(
        log.cues,
        vec![
            AudioCue::Spin,
            AudioCue::ReelStop(0),
            AudioCue::ReelStop(1),
            AudioCue::ReelStop(2),
            AudioCue::ReelStop(3),
            AudioCue::ReelStop(4),
            AudioCue::BigWin,
        ]
    );
}

#[test]
fn test_losing_spin_plays_lose_cue() {
    let (mut machine, log) = recording_machine(test_config(), RevealMode::Immediate);
    machine.force_next_grid(losing_grid()).unwrap();

    let report = settled(machine.request_spin().unwrap());
    assert_eq!(report.credited, 0.0);
    assert_relative_eq!(machine.state().balance, 9_900.0);
    assert_eq!(log.borrow().cues.last(), Some(&AudioCue::Lose));
    assert!(log.borrow().highlighted.is_empty());
}

#[test]
fn test_bonus_symbols_award_free_spins_without_debit() {
    let (mut machine, log) = recording_machine(test_config(), RevealMode::Immediate);
    machine.force_next_grid(three_bonus_grid()).unwrap();

    let trigger = settled(machine.request_spin().unwrap());
    assert_eq!(trigger.free_spins_awarded.map(|a| a.spins), Some(5));
    assert_eq!(machine.state().free_spins_remaining, 5);
    assert_eq!(
        machine.scheduled().map(|s| s.kind),
        Some(ScheduledKind::Free)
    );
    assert!(log.borrow().cues.contains(&AudioCue::FreeSpinsTriggered));
    assert!(
        log.borrow()
            .notices
            .iter()
            .any(|(_, category)| *category == NoticeCategory::FreeSpin)
    );

    let before = machine.state().balance;
    machine.force_next_grid(middle_line_grid()).unwrap();
    let reports = machine.advance(1.0);

    assert_eq!(reports.len(), 1);
    let free = &reports[0];
    assert!(free.free_spin);
    assert_eq!(free.debited, 0.0);
    assert_relative_eq!(machine.state().balance, before + free.credited);
    assert_relative_eq!(free.credited, 8000.0);
    assert_eq!(machine.state().free_spins_remaining, 4);
}

#[test]
fn test_free_spins_run_out_and_stop_chaining() {
    // Bonus can be forced onto the grid but never lands on its own
    let config = losing_config().with_symbols(SymbolCatalog::new(vec![
        Symbol::normal(1, "A", 0.0, 1.0),
        Symbol::normal(2, "B", 0.0, 1.0),
        Symbol::bonus(BONUS, "Bonus", 0.0),
    ]));
    let (mut machine, _log) = recording_machine(config, RevealMode::Immediate);
    machine
        .force_next_grid(
            Grid::from_rows(vec![
                vec![BONUS, 1, 2, 1, 2],
                vec![1, BONUS, 2, 1, 2],
                vec![2, 1, BONUS, 1, 2],
            ])
            .unwrap(),
        )
        .unwrap();
    settled(machine.request_spin().unwrap());
    assert_eq!(machine.state().free_spins_remaining, 5);

    let reports = machine.advance(1_000.0);
    assert_eq!(reports.len(), 5);
    assert!(reports.iter().all(|r| r.free_spin && r.debited == 0.0));
    assert_eq!(machine.state().free_spins_remaining, 0);
    assert!(machine.scheduled().is_none());
    assert_relative_eq!(machine.state().balance, 9_900.0);
    assert_eq!(machine.stats().free_spins, 5);
}

#[test]
fn test_spin_while_in_flight_is_ignored() {
    let (mut machine, log) = recording_machine(test_config(), RevealMode::Deferred);

    let spin_id = match machine.request_spin().unwrap() {
        SpinRequest::Pending { spin_id } => spin_id,
        other => panic!("expected a pending spin, got {other:?}"),
    };
    assert!(machine.state().is_spinning());
    assert_eq!(machine.state().phase, SpinPhase::Spinning);
    assert_relative_eq!(machine.state().balance, 9_900.0);

    assert_eq!(machine.request_spin().unwrap(), SpinRequest::Ignored);
    assert_relative_eq!(machine.state().balance, 9_900.0);
    assert_eq!(log.borrow().reveals, vec![spin_id]);

    let report = machine.complete_reveal(spin_id).unwrap();
    assert_eq!(report.spin_id, spin_id);
    assert!(!report.reveal_timed_out);
    assert!(!machine.state().is_spinning());
}

#[test]
fn test_stale_reveal_completion_ignored() {
    let (mut machine, _log) = recording_machine(test_config(), RevealMode::Deferred);

    let SpinRequest::Pending { spin_id } = machine.request_spin().unwrap() else {
        panic!("expected a pending spin");
    };
    assert!(machine.complete_reveal(spin_id + 5).is_none());
    assert_eq!(machine.pending_spin_id(), Some(spin_id));
    assert!(machine.complete_reveal(spin_id).is_some());
    assert!(machine.complete_reveal(spin_id).is_none());
}

#[test]
fn test_reveal_timeout_forces_completion() {
    let config = test_config().with_timing(TimingConfig::normal());
    let (mut machine, _log) = recording_machine(config, RevealMode::Deferred);

    machine.request_spin().unwrap();
    // Last reel stops at 3200 ms, plus a 2000 ms grace period
    assert!(machine.advance(5_000.0).is_empty());
    assert!(machine.state().is_spinning());

    let reports = machine.advance(300.0);
    assert_eq!(reports.len(), 1);
    assert!(reports[0].reveal_timed_out);
    assert!(!machine.state().is_spinning());
}

#[test]
fn test_insufficient_funds_rejected_without_change() {
    let mut config = test_config();
    config.starting_balance = 80.0;
    let (mut machine, log) = recording_machine(config, RevealMode::Immediate);

    let result = machine.request_spin();
    assert!(matches!(
        result,
        Err(SlotError::InsufficientFunds { balance, bet }) if balance == 80.0 && bet == 100.0
    ));
    assert_relative_eq!(machine.state().balance, 80.0);
    assert_relative_eq!(machine.state().jackpot_pool, 50_000.0);
    assert_eq!(machine.state().phase, SpinPhase::Idle);
    assert_eq!(machine.stats().total_spins, 0);
    assert!(log.borrow().reveals.is_empty());
    assert_eq!(
        log.borrow().notices.last().map(|(_, c)| *c),
        Some(NoticeCategory::Error)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHAINING
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_auto_spin_chains_on_the_clock() {
    let (mut machine, _log) = recording_machine(test_config(), RevealMode::Immediate);
    assert!(machine.toggle_auto_spin());

    settled(machine.request_spin().unwrap());
    assert!(machine.scheduled().is_some());

    // Instant timing still keeps chained spins one millisecond apart
    let reports = machine.advance(10.0);
    assert_eq!(reports.len(), 10);
    assert_eq!(machine.stats().total_spins, 11);

    let ids: Vec<u64> = reports.iter().map(|r| r.spin_id).collect();
    assert!(ids.windows(2).all(|w| w[1] == w[0] + 1));
}

#[test]
fn test_long_auto_run_in_one_advance() {
    let mut config = losing_config();
    config.starting_balance = 1_000_000.0;
    let (mut machine, _log) = recording_machine(config, RevealMode::Immediate);
    machine.toggle_auto_spin();

    settled(machine.request_spin().unwrap());
    let reports = machine.advance(5_000.0);

    assert_eq!(reports.len(), 5_000);
    assert_relative_eq!(machine.state().balance, 1_000_000.0 - 5_001.0 * 100.0);
}

#[test]
fn test_toggle_off_cancels_pending_auto_spin() {
    let (mut machine, _log) = recording_machine(test_config(), RevealMode::Immediate);
    machine.toggle_auto_spin();
    machine.force_next_grid(losing_grid()).unwrap();
    settled(machine.request_spin().unwrap());
    assert_eq!(
        machine.scheduled().map(|s| s.kind),
        Some(ScheduledKind::Auto)
    );

    assert!(!machine.toggle_auto_spin());
    assert!(machine.scheduled().is_none());
    assert!(machine.advance(10_000.0).is_empty());
}

#[test]
fn test_toggle_off_keeps_free_spins_chaining() {
    let (mut machine, _log) = recording_machine(test_config(), RevealMode::Immediate);
    machine.toggle_auto_spin();
    machine.force_next_grid(three_bonus_grid()).unwrap();
    settled(machine.request_spin().unwrap());

    machine.toggle_auto_spin();
    assert_eq!(
        machine.scheduled().map(|s| s.kind),
        Some(ScheduledKind::Free)
    );
    assert_eq!(machine.advance(1.0).len(), 1);
}

#[test]
fn test_auto_spin_stops_when_balance_runs_out() {
    let mut config = losing_config();
    config.starting_balance = 250.0;
    let (mut machine, log) = recording_machine(config, RevealMode::Immediate);
    machine.toggle_auto_spin();

    settled(machine.request_spin().unwrap());
    let reports = machine.advance(100.0);

    assert_eq!(reports.len(), 1);
    assert_relative_eq!(machine.state().balance, 50.0);
    assert!(!machine.state().auto_spin_enabled);
    assert!(machine.scheduled().is_none());
    assert!(
        log.borrow()
            .notices
            .iter()
            .any(|(message, category)| *category == NoticeCategory::Info
                && message.contains("Auto-spin stopped"))
    );
}

#[test]
fn test_chained_spins_wait_for_deferred_reveal() {
    let config = test_config().with_timing(TimingConfig::turbo());
    let (mut machine, _log) = recording_machine(config, RevealMode::Deferred);
    machine.toggle_auto_spin();

    let SpinRequest::Pending { spin_id } = machine.request_spin().unwrap() else {
        panic!("expected a pending spin");
    };
    machine.complete_reveal(spin_id).unwrap();

    // Auto delay is 400 ms in turbo; the next spin then waits for its own reveal
    assert!(machine.advance(399.0).is_empty());
    assert!(machine.advance(1.0).is_empty());
    assert_eq!(machine.pending_spin_id(), Some(spin_id + 1));
    assert!(machine.scheduled().is_none());
}

// ═══════════════════════════════════════════════════════════════════════════════
// BET COMMANDS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_bet_commands() {
    let (mut machine, _log) = recording_machine(test_config(), RevealMode::Immediate);

    assert_eq!(machine.increase_bet().unwrap(), 150.0);
    assert_eq!(machine.decrease_bet().unwrap(), 100.0);
    assert_eq!(machine.decrease_bet().unwrap(), 50.0);

    assert!(matches!(
        machine.decrease_bet(),
        Err(SlotError::InvalidBetAmount { requested, .. }) if requested == 0.0
    ));
    assert_eq!(machine.state().bet_amount, 50.0);

    assert!(machine.change_bet(2_000.0).is_err());
    assert_eq!(machine.state().bet_amount, 50.0);

    assert_eq!(machine.set_max_bet().unwrap(), 1000.0);
}

#[test]
fn test_bet_above_balance_rejected() {
    let mut config = test_config();
    config.starting_balance = 300.0;
    let (mut machine, _log) = recording_machine(config, RevealMode::Immediate);

    assert!(machine.change_bet(300.0).is_err());
    assert_eq!(machine.change_bet(200.0).unwrap(), 300.0);
    assert_eq!(machine.set_max_bet().unwrap(), 300.0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEATURES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_scatter_multiplier_applies_to_next_spin() {
    let (mut machine, log) = recording_machine(test_config(), RevealMode::Immediate);
    machine.force_next_grid(three_scatter_grid()).unwrap();

    let trigger = settled(machine.request_spin().unwrap());
    assert_relative_eq!(trigger.credited, 500.0);
    assert_eq!(trigger.multiplier_applied, 1);
    let award = trigger.multiplier_awarded.unwrap();
    assert!((2..=5).contains(&award.multiplier));
    assert!(trigger.free_spins_awarded.is_none());
    assert!(log.borrow().cues.contains(&AudioCue::BonusTriggered));

    machine.force_next_grid(middle_line_grid()).unwrap();
    let boosted = settled(machine.request_spin().unwrap());
    assert_eq!(boosted.multiplier_applied, award.multiplier);
    assert_relative_eq!(boosted.credited, 8000.0 * f64::from(award.multiplier));
    assert_eq!(machine.state().multiplier_spins_remaining, 4);
}

#[test]
fn test_multiplier_window_expires() {
    let (mut machine, _log) = recording_machine(test_config(), RevealMode::Immediate);
    machine.force_next_grid(three_scatter_grid()).unwrap();
    settled(machine.request_spin().unwrap());

    for _ in 0..5 {
        machine.force_next_grid(losing_grid()).unwrap();
        settled(machine.request_spin().unwrap());
    }
    assert_eq!(machine.state().win_multiplier, 1);

    machine.force_next_grid(middle_line_grid()).unwrap();
    let report = settled(machine.request_spin().unwrap());
    assert_eq!(report.multiplier_applied, 1);
    assert_relative_eq!(report.credited, 8000.0);
}

#[test]
fn test_jackpot_awarded_when_payout_reaches_pool() {
    let mut config = test_config();
    config.features.jackpot.starting_pool = 5_000.0;
    let (mut machine, log) = recording_machine(config, RevealMode::Immediate);
    machine.force_next_grid(middle_line_grid()).unwrap();

    let report = settled(machine.request_spin().unwrap());

    // Pool grew by 1% of the bet before settlement
    assert!(report.jackpot_triggered);
    assert_relative_eq!(report.jackpot_award.unwrap(), 5_001.0);
    assert_relative_eq!(report.credited, 13_001.0);
    assert_relative_eq!(machine.state().jackpot_pool, 15_001.0);
    assert_relative_eq!(machine.state().balance, 10_000.0 - 100.0 + 13_001.0);
    assert_eq!(machine.stats().jackpots_won, 1);

    let log = log.borrow();
    assert_eq!(log.cues.last(), Some(&AudioCue::Jackpot));
    assert!(log.notices.iter().any(|(_, c)| *c == NoticeCategory::Jackpot));
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════════

fn auto_session(seed: u64, spins: f64) -> (Vec<SpinReport>, SlotMachine) {
    let mut machine = SlotMachine::with_seed(test_config(), seed).unwrap();
    machine.toggle_auto_spin();
    let mut reports = vec![settled(machine.request_spin().unwrap())];
    reports.extend(machine.advance(spins));
    (reports, machine)
}

#[test]
fn test_same_seed_same_session() {
    let (first, _) = auto_session(99, 200.0);
    let (second, _) = auto_session(99, 200.0);
    assert_eq!(first, second);
}

#[test]
fn test_balance_accounting_holds_every_spin() {
    let (reports, machine) = auto_session(2024, 500.0);
    let mut balance = 10_000.0;

    for report in &reports {
        if report.free_spin {
            assert_eq!(report.debited, 0.0);
        } else {
            assert_eq!(report.debited, report.bet);
        }
        balance = balance - report.debited + report.credited;
        assert_relative_eq!(report.balance_after, balance, epsilon = 1e-6);
        assert!(report.balance_after >= 0.0);
        assert!(report.multiplier_applied >= 1);
    }

    assert_relative_eq!(machine.state().balance, balance, epsilon = 1e-6);
    assert_eq!(machine.stats().total_spins, reports.len() as u64);
    assert_relative_eq!(
        machine.stats().total_win,
        reports.iter().map(|r| r.credited).sum::<f64>(),
        epsilon = 1e-6
    );
}

#[test]
fn test_rebuilt_reels_still_produce_catalog_symbols() {
    let mut machine = SlotMachine::with_seed(test_config(), 5).unwrap();
    machine.rebuild_reels().unwrap();

    let report = settled(machine.request_spin().unwrap());
    assert!(report.grid.check_symbols(&machine.config().symbols).is_ok());
    assert_eq!(report.grid.reels(), 5);
    assert_eq!(report.grid.rows(), 3);
}
