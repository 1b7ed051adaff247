//! Symbol definitions and the symbol catalog

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};

/// Symbol kind classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Regular paying symbol, matched along paylines
    Normal,
    /// Wild - substitutes for Normal symbols on a payline
    Wild,
    /// Scatter - pays and triggers by grid-wide count
    Scatter,
    /// Bonus - triggers free spins by grid-wide count
    Bonus,
}

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Unique symbol ID
    pub id: u32,
    /// Symbol name (e.g., "7", "Fire", "Wild")
    pub name: String,
    /// Line pay value, scaled by run length and bet
    pub payout_value: f64,
    /// Relative selection weight on generated reel strips
    pub selection_weight: f64,
    /// Symbol kind
    pub kind: SymbolKind,
}

impl Symbol {
    /// Create a normal paying symbol
    pub fn normal(id: u32, name: impl Into<String>, payout_value: f64, weight: f64) -> Self {
        Self {
            id,
            name: name.into(),
            payout_value,
            selection_weight: weight,
            kind: SymbolKind::Normal,
        }
    }

    /// Create a wild symbol
    pub fn wild(id: u32, name: impl Into<String>, payout_value: f64, weight: f64) -> Self {
        Self {
            id,
            name: name.into(),
            payout_value,
            selection_weight: weight,
            kind: SymbolKind::Wild,
        }
    }

    /// Create a scatter symbol (pays through the scatter table, not lines)
    pub fn scatter(id: u32, name: impl Into<String>, weight: f64) -> Self {
        Self {
            id,
            name: name.into(),
            payout_value: 0.0,
            selection_weight: weight,
            kind: SymbolKind::Scatter,
        }
    }

    /// Create a bonus symbol
    pub fn bonus(id: u32, name: impl Into<String>, weight: f64) -> Self {
        Self {
            id,
            name: name.into(),
            payout_value: 0.0,
            selection_weight: weight,
            kind: SymbolKind::Bonus,
        }
    }

    pub fn is_wild(&self) -> bool {
        self.kind == SymbolKind::Wild
    }

    /// Scatter and bonus symbols only count grid-wide
    pub fn is_special(&self) -> bool {
        matches!(self.kind, SymbolKind::Scatter | SymbolKind::Bonus)
    }
}

/// The static symbol catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolCatalog {
    pub symbols: Vec<Symbol>,
}

impl SymbolCatalog {
    /// Create a catalog from a list of symbols
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self { symbols }
    }

    /// The cyberpunk symbol set: eight paying symbols, wild, scatter and bonus.
    /// Higher paying symbols land less often.
    pub fn cyberpunk() -> Self {
        Self::new(vec![
            Symbol::normal(1, "7", 10.0, 20.0),
            Symbol::normal(2, "BAR", 15.0, 18.0),
            Symbol::normal(3, "Diamond", 25.0, 15.0),
            Symbol::normal(4, "Lightning", 40.0, 12.0),
            Symbol::normal(5, "Star", 60.0, 10.0),
            Symbol::normal(6, "Cyber", 100.0, 7.0),
            Symbol::normal(7, "Target", 150.0, 5.0),
            Symbol::normal(8, "Fire", 250.0, 3.0),
            Symbol::wild(9, "Wild", 500.0, 3.0),
            Symbol::scatter(10, "Scatter", 3.0),
            Symbol::bonus(11, "Bonus", 2.0),
        ])
    }

    /// Get symbol by ID
    pub fn get(&self, id: u32) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.id == id)
    }

    /// Get symbol by name
    pub fn by_name(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    /// All symbol IDs of one kind, in catalog order
    pub fn ids_of(&self, kind: SymbolKind) -> Vec<u32> {
        self.symbols
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.id)
            .collect()
    }

    /// Sum of all selection weights
    pub fn total_weight(&self) -> f64 {
        self.symbols.iter().map(|s| s.selection_weight).sum()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Check ids, names, values and weights
    pub fn validate(&self) -> SlotResult<()> {
        if self.symbols.is_empty() {
            return Err(SlotError::config("symbol catalog is empty"));
        }

        for (i, symbol) in self.symbols.iter().enumerate() {
            if self.symbols[..i].iter().any(|s| s.id == symbol.id) {
                return Err(SlotError::config(format!("duplicate symbol id {}", symbol.id)));
            }
            if self.symbols[..i].iter().any(|s| s.name == symbol.name) {
                return Err(SlotError::config(format!(
                    "duplicate symbol name '{}'",
                    symbol.name
                )));
            }
            if !symbol.payout_value.is_finite() || symbol.payout_value < 0.0 {
                return Err(SlotError::config(format!(
                    "symbol '{}' has invalid payout value {}",
                    symbol.name, symbol.payout_value
                )));
            }
            if !symbol.selection_weight.is_finite() || symbol.selection_weight < 0.0 {
                return Err(SlotError::config(format!(
                    "symbol '{}' has invalid selection weight {}",
                    symbol.name, symbol.selection_weight
                )));
            }
        }

        let total = self.total_weight();
        if !(total > 0.0) {
            return Err(SlotError::config(format!(
                "total selection weight must be positive, got {total}"
            )));
        }

        Ok(())
    }
}

impl Default for SymbolCatalog {
    fn default() -> Self {
        Self::cyberpunk()
    }
}
