//! Reel strips and weighted strip generation

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::symbols::SymbolCatalog;

/// A generated reel strip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReelStrip {
    /// Symbol IDs in order
    pub symbols: Vec<u32>,
    /// Reel index
    pub reel_index: u8,
}

impl ReelStrip {
    /// Create a new reel strip
    pub fn new(reel_index: u8, symbols: Vec<u32>) -> Self {
        Self { symbols, reel_index }
    }

    /// Get symbol at position (wraps around)
    pub fn symbol_at(&self, position: usize) -> Option<u32> {
        if self.symbols.is_empty() {
            return None;
        }
        Some(self.symbols[position % self.symbols.len()])
    }

    /// Get total strip length
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Draw one symbol ID with probability proportional to its weight.
///
/// `r` is drawn from `[0, total)` and the catalog is scanned, subtracting each
/// weight until the remainder reaches zero. Zero-weight symbols are never picked.
fn pick_weighted<R: Rng + ?Sized>(catalog: &SymbolCatalog, total: f64, rng: &mut R) -> u32 {
    let mut remainder = rng.random_range(0.0..total);
    let mut last_positive = None;

    for symbol in &catalog.symbols {
        if symbol.selection_weight <= 0.0 {
            continue;
        }
        last_positive = Some(symbol.id);
        remainder -= symbol.selection_weight;
        if remainder <= 0.0 {
            return symbol.id;
        }
    }

    // Rounding can leave a sliver of remainder after the last symbol
    last_positive.unwrap_or_default()
}

/// Generate one reel strip of `length` symbols by weighted sampling with replacement
pub fn generate_strip<R: Rng + ?Sized>(
    catalog: &SymbolCatalog,
    reel_index: u8,
    length: usize,
    rng: &mut R,
) -> SlotResult<ReelStrip> {
    let total = catalog.total_weight();
    if !total.is_finite() || total <= 0.0 {
        return Err(SlotError::config(format!(
            "cannot generate reel {reel_index}: total selection weight is {total}"
        )));
    }
    if length == 0 {
        return Err(SlotError::config("reel strip length must be at least 1"));
    }

    let symbols = (0..length)
        .map(|_| pick_weighted(catalog, total, rng))
        .collect();

    Ok(ReelStrip::new(reel_index, symbols))
}

/// Generate one strip per reel
pub fn generate_strips<R: Rng + ?Sized>(
    catalog: &SymbolCatalog,
    reel_count: u8,
    length: usize,
    rng: &mut R,
) -> SlotResult<Vec<ReelStrip>> {
    (0..reel_count)
        .map(|reel| generate_strip(catalog, reel, length, rng))
        .collect()
}
