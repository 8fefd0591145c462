//! Watch Set
//!
//! The set of symbols the external layer is currently interested in.
//! The watch set is supplied and mutated exclusively by the external
//! layer; the aggregator treats it as a read-only snapshot per update.

use std::collections::HashSet;

/// A ticker symbol.
pub type Symbol = String;

/// Externally controlled set of watched symbols.
///
/// Watching is exclusive, not a display filter: series for symbols
/// outside the watch set are purged entirely by the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSet {
    symbols: HashSet<Symbol>,
}

impl WatchSet {
    /// Create an empty watch set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a symbol is watched.
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    /// Add a symbol. Returns `true` if it was not already watched.
    pub fn insert(&mut self, symbol: impl Into<Symbol>) -> bool {
        self.symbols.insert(symbol.into())
    }

    /// Remove a symbol. Returns `true` if it was watched.
    pub fn remove(&mut self, symbol: &str) -> bool {
        self.symbols.remove(symbol)
    }

    /// Check whether the watch set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Number of watched symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Iterate over watched symbols in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Watched symbols sorted for deterministic output.
    #[must_use]
    pub fn sorted(&self) -> Vec<Symbol> {
        let mut symbols: Vec<_> = self.symbols.iter().cloned().collect();
        symbols.sort();
        symbols
    }
}

impl FromIterator<Symbol> for WatchSet {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Self {
            symbols: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for WatchSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self {
            symbols: iter.into_iter().map(str::to_string).collect(),
        }
    }
}
