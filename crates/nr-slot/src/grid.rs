//! Visible symbol grid and the grid sampler

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::reels::ReelStrip;
use crate::symbols::SymbolCatalog;

/// The visible window of one spin, stored column-major (reels × rows)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    columns: Vec<Vec<u32>>,
}

impl Grid {
    /// Build a grid from columns. Every column must have the same, non-zero height.
    pub fn from_columns(columns: Vec<Vec<u32>>) -> SlotResult<Self> {
        let Some(first) = columns.first() else {
            return Err(SlotError::InvalidGrid("grid has no reels".into()));
        };
        let rows = first.len();
        if rows == 0 {
            return Err(SlotError::InvalidGrid("grid has no rows".into()));
        }
        if let Some((reel, column)) = columns.iter().enumerate().find(|(_, c)| c.len() != rows) {
            return Err(SlotError::InvalidGrid(format!(
                "reel {reel} has {} rows, expected {rows}",
                column.len()
            )));
        }
        Ok(Self { columns })
    }

    /// Build a grid from rows as they appear on screen (top row first)
    pub fn from_rows(rows: Vec<Vec<u32>>) -> SlotResult<Self> {
        let reel_count = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|r| r.len() != reel_count) {
            return Err(SlotError::InvalidGrid("rows have different lengths".into()));
        }
        let columns = (0..reel_count)
            .map(|reel| rows.iter().map(|row| row[reel]).collect())
            .collect();
        Self::from_columns(columns)
    }

    /// Number of reels (columns)
    pub fn reels(&self) -> usize {
        self.columns.len()
    }

    /// Number of visible rows
    pub fn rows(&self) -> usize {
        self.columns.first().map(Vec::len).unwrap_or(0)
    }

    /// Symbol at (reel, row)
    pub fn symbol_at(&self, reel: usize, row: usize) -> Option<u32> {
        self.columns.get(reel).and_then(|c| c.get(row)).copied()
    }

    /// One reel's visible symbols, top to bottom
    pub fn column(&self, reel: usize) -> Option<&[u32]> {
        self.columns.get(reel).map(Vec::as_slice)
    }

    /// Iterate over every cell as (reel, row, symbol id)
    pub fn cells(&self) -> impl Iterator<Item = (u8, u8, u32)> + '_ {
        self.columns.iter().enumerate().flat_map(|(reel, column)| {
            column
                .iter()
                .enumerate()
                .map(move |(row, &id)| (reel as u8, row as u8, id))
        })
    }

    /// Ensure every cell refers to a catalog symbol
    pub fn check_symbols(&self, catalog: &SymbolCatalog) -> SlotResult<()> {
        match self.cells().find(|(_, _, id)| catalog.get(*id).is_none()) {
            Some((reel, row, id)) => Err(SlotError::InvalidGrid(format!(
                "unknown symbol {id} at reel {reel}, row {row}"
            ))),
            None => Ok(()),
        }
    }
}

/// Sample the visible window: one independent random offset per reel,
/// then `visible_rows` consecutive symbols with wrap-around.
pub fn sample_grid<R: Rng + ?Sized>(
    strips: &[ReelStrip],
    visible_rows: usize,
    rng: &mut R,
) -> SlotResult<Grid> {
    let mut columns = Vec::with_capacity(strips.len());

    for strip in strips {
        if strip.len() < visible_rows {
            return Err(SlotError::config(format!(
                "reel {} strip has {} symbols, fewer than {visible_rows} visible rows",
                strip.reel_index,
                strip.len()
            )));
        }
        let start = rng.random_range(0..strip.len());
        let column = (0..visible_rows)
            .filter_map(|row| strip.symbol_at(start + row))
            .collect();
        columns.push(column);
    }

    Grid::from_columns(columns)
}
