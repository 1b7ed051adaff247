//! Paytable and win evaluation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::grid::Grid;
use crate::symbols::{Symbol, SymbolCatalog, SymbolKind};

/// Minimum consecutive symbols for a line win
pub const MIN_LINE_RUN: u8 = 3;

/// A payline definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payline {
    /// Payline index (0-based)
    pub index: u8,
    /// Row positions for each reel (e.g., [0, 1, 2, 1, 0] for a "V" shape)
    pub positions: Vec<u8>,
}

impl Payline {
    /// Create a straight line (same row across all reels)
    pub fn straight(index: u8, row: u8, reel_count: u8) -> Self {
        Self {
            index,
            positions: vec![row; reel_count as usize],
        }
    }

    /// Create a line from explicit row positions
    pub fn new(index: u8, positions: Vec<u8>) -> Self {
        Self { index, positions }
    }
}

/// The three straight lines of the classic layout: top, middle, bottom
pub fn straight_paylines(rows: u8, reel_count: u8) -> Vec<Payline> {
    (0..rows)
        .map(|row| Payline::straight(row, row, reel_count))
        .collect()
}

/// Standard payline patterns for a 5×3 grid
pub fn standard_20_paylines() -> Vec<Payline> {
    vec![
        // Straight lines
        Payline::straight(0, 0, 5), // Top
        Payline::straight(1, 1, 5), // Middle
        Payline::straight(2, 2, 5), // Bottom
        // V shapes
        Payline::new(3, vec![0, 1, 2, 1, 0]),
        Payline::new(4, vec![2, 1, 0, 1, 2]),
        // Zigzag
        Payline::new(5, vec![0, 0, 1, 2, 2]),
        Payline::new(6, vec![2, 2, 1, 0, 0]),
        Payline::new(7, vec![1, 0, 0, 0, 1]),
        Payline::new(8, vec![1, 2, 2, 2, 1]),
        // W shapes
        Payline::new(9, vec![0, 1, 0, 1, 0]),
        Payline::new(10, vec![2, 1, 2, 1, 2]),
        // Diagonal
        Payline::new(11, vec![0, 1, 1, 1, 0]),
        Payline::new(12, vec![2, 1, 1, 1, 2]),
        // Steps
        Payline::new(13, vec![1, 1, 0, 1, 1]),
        Payline::new(14, vec![1, 1, 2, 1, 1]),
        // Complex
        Payline::new(15, vec![0, 2, 0, 2, 0]),
        Payline::new(16, vec![2, 0, 2, 0, 2]),
        Payline::new(17, vec![1, 0, 1, 0, 1]),
        Payline::new(18, vec![1, 2, 1, 2, 1]),
        Payline::new(19, vec![0, 0, 2, 0, 0]),
    ]
}

/// Check every payline against the grid shape
pub fn validate_paylines(paylines: &[Payline], reels: u8, rows: u8) -> SlotResult<()> {
    if paylines.is_empty() {
        return Err(SlotError::config("at least one payline is required"));
    }
    for line in paylines {
        if line.positions.len() != reels as usize {
            return Err(SlotError::config(format!(
                "payline {} has {} positions for {reels} reels",
                line.index,
                line.positions.len()
            )));
        }
        if let Some(row) = line.positions.iter().find(|&&row| row >= rows) {
            return Err(SlotError::config(format!(
                "payline {} references row {row}, grid has {rows} rows",
                line.index
            )));
        }
    }
    Ok(())
}

/// Look up a count-keyed tier: the entry with the largest key not above `count`
pub(crate) fn tier_lookup<T: Copy>(table: &BTreeMap<u8, T>, count: u8) -> Option<T> {
    table.range(..=count).next_back().map(|(_, v)| *v)
}

/// Payout rules applied by the evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutRules {
    /// Run length → line multiplier
    pub length_multipliers: BTreeMap<u8, f64>,
    /// Line pays are divided by this
    pub pay_divisor: f64,
    /// Scatter count → total bet multiplier
    pub scatter_pays: BTreeMap<u8, f64>,
    /// Scatters needed for the multiplier bonus
    pub scatter_trigger_count: u8,
    /// Scatters needed for the higher tier (free spins on top of the bonus)
    pub scatter_free_spins_count: u8,
    /// Bonus symbols needed for free spins
    pub bonus_trigger_count: u8,
}

impl Default for PayoutRules {
    fn default() -> Self {
        Self {
            length_multipliers: BTreeMap::from([(3, 1.0), (4, 2.0), (5, 3.0)]),
            pay_divisor: 10.0,
            scatter_pays: BTreeMap::from([(3, 5.0), (4, 20.0), (5, 100.0)]),
            scatter_trigger_count: 3,
            scatter_free_spins_count: 4,
            bonus_trigger_count: 3,
        }
    }
}

impl PayoutRules {
    /// Line multiplier for a run length
    pub fn length_multiplier(&self, run: u8) -> f64 {
        tier_lookup(&self.length_multipliers, run).unwrap_or(0.0)
    }

    /// Scatter bet multiplier for a scatter count
    pub fn scatter_multiplier(&self, count: u8) -> f64 {
        if count < self.scatter_trigger_count {
            return 0.0;
        }
        tier_lookup(&self.scatter_pays, count).unwrap_or(0.0)
    }

    pub fn validate(&self) -> SlotResult<()> {
        if !self.pay_divisor.is_finite() || self.pay_divisor <= 0.0 {
            return Err(SlotError::config(format!(
                "pay divisor must be positive, got {}",
                self.pay_divisor
            )));
        }
        if !self.length_multipliers.contains_key(&MIN_LINE_RUN) {
            return Err(SlotError::config(format!(
                "length multipliers must define a run of {MIN_LINE_RUN}"
            )));
        }
        let tables = self
            .length_multipliers
            .values()
            .chain(self.scatter_pays.values());
        for value in tables {
            if !value.is_finite() || *value < 0.0 {
                return Err(SlotError::config(format!("invalid pay multiplier {value}")));
            }
        }
        if self.scatter_trigger_count == 0 || self.bonus_trigger_count == 0 {
            return Err(SlotError::config("trigger counts must be at least 1"));
        }
        if self.scatter_free_spins_count < self.scatter_trigger_count {
            return Err(SlotError::config(
                "scatter free spin count must not be below the scatter trigger count",
            ));
        }
        Ok(())
    }
}

/// A win result on a single payline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineWin {
    /// Payline index
    pub line_index: u8,
    /// Paying symbol ID (the Wild itself for an all-wild run)
    pub symbol_id: u32,
    /// Symbol name
    pub symbol_name: String,
    /// Number of matching symbols from the left
    pub match_count: u8,
    /// Win amount
    pub win_amount: f64,
    /// Positions of winning symbols (reel, row)
    pub positions: Vec<(u8, u8)>,
    /// Wild positions included
    pub wild_positions: Vec<(u8, u8)>,
}

/// Scatter win result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterWin {
    /// Number of scatters
    pub count: u8,
    /// Total bet multiplier
    pub multiplier: f64,
    /// Win amount
    pub win_amount: f64,
    /// Positions of scatters
    pub positions: Vec<(u8, u8)>,
}

/// Grid-wide feature triggers found by the evaluator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureTriggers {
    /// Enough scatters for the win multiplier bonus
    pub multiplier_bonus: bool,
    /// Enough scatters for the higher tier free spins
    pub scatter_free_spins: bool,
    /// Enough bonus symbols for free spins
    pub bonus_free_spins: bool,
}

impl FeatureTriggers {
    pub fn any(&self) -> bool {
        self.multiplier_bonus || self.scatter_free_spins || self.bonus_free_spins
    }
}

/// Result of evaluating a grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    /// Line wins plus scatter win, before any multiplier
    pub total_payout: f64,
    /// Line wins
    pub winning_lines: Vec<LineWin>,
    /// Scatter symbols anywhere on the grid
    pub scatter_count: u8,
    /// Bonus symbols anywhere on the grid
    pub bonus_count: u8,
    /// Scatter win (if any)
    pub scatter_win: Option<ScatterWin>,
    /// Feature triggers
    pub triggers: FeatureTriggers,
}

impl SpinOutcome {
    /// Check if this is a winning spin
    pub fn is_win(&self) -> bool {
        self.total_payout > 0.0
    }

    /// Get win count
    pub fn win_count(&self) -> usize {
        self.winning_lines.len() + usize::from(self.scatter_win.is_some())
    }
}

/// Complete paytable: catalog, paylines and payout rules
#[derive(Debug, Clone)]
pub struct PayTable {
    /// Symbol definitions
    pub symbols: SymbolCatalog,
    /// Payline definitions
    pub paylines: Vec<Payline>,
    /// Payout rules
    pub rules: PayoutRules,
}

impl PayTable {
    /// Create a paytable
    pub fn new(symbols: SymbolCatalog, paylines: Vec<Payline>, rules: PayoutRules) -> Self {
        Self {
            symbols,
            paylines,
            rules,
        }
    }

    /// Evaluate wins on a grid. Pure: the same grid and bet always give the same outcome.
    pub fn evaluate(&self, grid: &Grid, bet: f64) -> SpinOutcome {
        let winning_lines: Vec<LineWin> = self
            .paylines
            .iter()
            .filter_map(|payline| self.evaluate_line(grid, payline, bet))
            .collect();

        let scatter_positions = self.positions_of(grid, SymbolKind::Scatter);
        let bonus_positions = self.positions_of(grid, SymbolKind::Bonus);
        let scatter_count = scatter_positions.len().min(u8::MAX as usize) as u8;
        let bonus_count = bonus_positions.len().min(u8::MAX as usize) as u8;

        let scatter_win = self.evaluate_scatter(scatter_positions, bet);

        let triggers = FeatureTriggers {
            multiplier_bonus: scatter_count >= self.rules.scatter_trigger_count,
            scatter_free_spins: scatter_count >= self.rules.scatter_free_spins_count,
            bonus_free_spins: bonus_count >= self.rules.bonus_trigger_count,
        };

        let line_total: f64 = winning_lines.iter().map(|w| w.win_amount).sum();
        let scatter_total = scatter_win.as_ref().map(|s| s.win_amount).unwrap_or(0.0);

        SpinOutcome {
            total_payout: line_total + scatter_total,
            winning_lines,
            scatter_count,
            bonus_count,
            scatter_win,
            triggers,
        }
    }

    fn evaluate_line(&self, grid: &Grid, payline: &Payline, bet: f64) -> Option<LineWin> {
        if payline.positions.len() != grid.reels() {
            return None;
        }

        // Symbols on this line, in reel order
        let line_symbols: Vec<&Symbol> = payline
            .positions
            .iter()
            .enumerate()
            .map(|(reel, &row)| {
                grid.symbol_at(reel, row as usize)
                    .and_then(|id| self.symbols.get(id))
            })
            .collect::<Option<_>>()?;

        let first = *line_symbols.first()?;
        if first.is_special() {
            return None;
        }

        // None while the run so far is all wild
        let mut reference: Option<&Symbol> = None;
        let mut positions = Vec::new();
        let mut wild_positions = Vec::new();

        for (reel, symbol) in line_symbols.iter().enumerate() {
            let matches = match symbol.kind {
                SymbolKind::Wild => true,
                SymbolKind::Normal => match reference {
                    None => {
                        reference = Some(symbol);
                        true
                    }
                    Some(r) => r.id == symbol.id,
                },
                SymbolKind::Scatter | SymbolKind::Bonus => false,
            };
            if !matches {
                break;
            }

            let cell = (reel as u8, payline.positions[reel]);
            if symbol.is_wild() {
                wild_positions.push(cell);
            }
            positions.push(cell);
        }

        let match_count = positions.len() as u8;
        if match_count < MIN_LINE_RUN {
            return None;
        }

        let paying = reference.unwrap_or(first);
        let win_amount = paying.payout_value
            * f64::from(match_count)
            * self.rules.length_multiplier(match_count)
            * bet
            / self.rules.pay_divisor;
        if win_amount <= 0.0 {
            return None;
        }

        Some(LineWin {
            line_index: payline.index,
            symbol_id: paying.id,
            symbol_name: paying.name.clone(),
            match_count,
            win_amount,
            positions,
            wild_positions,
        })
    }

    fn evaluate_scatter(&self, positions: Vec<(u8, u8)>, bet: f64) -> Option<ScatterWin> {
        let count = positions.len().min(u8::MAX as usize) as u8;
        let multiplier = self.rules.scatter_multiplier(count);
        if multiplier <= 0.0 {
            return None;
        }

        Some(ScatterWin {
            count,
            multiplier,
            win_amount: bet * multiplier,
            positions,
        })
    }

    /// All grid positions holding a symbol of `kind`
    fn positions_of(&self, grid: &Grid, kind: SymbolKind) -> Vec<(u8, u8)> {
        grid.cells()
            .filter(|(_, _, id)| self.symbols.get(*id).is_some_and(|s| s.kind == kind))
            .map(|(reel, row, _)| (reel, row))
            .collect()
    }
}
