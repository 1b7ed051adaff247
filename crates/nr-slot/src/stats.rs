//! Session statistics

use serde::{Deserialize, Serialize};

use crate::machine::SpinReport;

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub free_spins: u64,
    pub total_bet: f64,
    pub total_win: f64,
    pub wins: u64,
    pub losses: u64,
    pub big_wins: u64,
    pub features_triggered: u64,
    pub jackpots_won: u64,
    pub max_win_ratio: f64,
}

impl SessionStats {
    /// Calculate RTP
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            (self.total_win / self.total_bet) * 100.0
        } else {
            0.0
        }
    }

    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Record one settled spin
    pub(crate) fn record(&mut self, report: &SpinReport, big_win: bool) {
        self.total_spins += 1;
        if report.free_spin {
            self.free_spins += 1;
        }
        self.total_bet += report.debited;
        self.total_win += report.credited;

        if report.credited > 0.0 {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        if big_win {
            self.big_wins += 1;
        }
        if report.feature_triggered() {
            self.features_triggered += 1;
        }
        if report.jackpot_triggered {
            self.jackpots_won += 1;
        }

        self.max_win_ratio = self.max_win_ratio.max(report.win_ratio());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::paytable::{FeatureTriggers, SpinOutcome};

    fn report(debited: f64, credited: f64) -> SpinReport {
        SpinReport {
            spin_id: 1,
            grid: Grid::from_rows(vec![vec![1, 2, 3]]).unwrap(),
            outcome: SpinOutcome {
                total_payout: credited,
                winning_lines: Vec::new(),
                scatter_count: 0,
                bonus_count: 0,
                scatter_win: None,
                triggers: FeatureTriggers::default(),
            },
            bet: 100.0,
            debited,
            free_spin: debited == 0.0,
            multiplier_applied: 1,
            credited,
            jackpot_award: None,
            jackpot_triggered: false,
            free_spins_awarded: None,
            multiplier_awarded: None,
            reveal_timed_out: false,
            balance_after: 0.0,
        }
    }

    #[test]
    fn test_rtp_and_hit_rate() {
        let mut stats = SessionStats::default();
        stats.record(&report(100.0, 0.0), false);
        stats.record(&report(100.0, 300.0), false);
        stats.record(&report(0.0, 100.0), false);

        assert_eq!(stats.total_spins, 3);
        assert_eq!(stats.free_spins, 1);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.rtp(), 200.0);
        assert!((stats.hit_rate() - 66.666).abs() < 0.01);
        assert_eq!(stats.max_win_ratio, 3.0);
    }

    #[test]
    fn test_big_wins_and_jackpots_counted() {
        let mut stats = SessionStats::default();
        let mut jackpot = report(100.0, 60_000.0);
        jackpot.jackpot_triggered = true;
        stats.record(&jackpot, true);

        assert_eq!(stats.big_wins, 1);
        assert_eq!(stats.jackpots_won, 1);
        assert_eq!(stats.features_triggered, 0);
    }

    #[test]
    fn test_empty_stats() {
        let stats = SessionStats::default();
        assert_eq!(stats.rtp(), 0.0);
        assert_eq!(stats.hit_rate(), 0.0);
    }
}
