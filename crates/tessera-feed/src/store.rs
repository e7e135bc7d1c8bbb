//! Per-symbol price store.
//!
//! Entries move `Absent -> Set -> Absent`. A present entry is never replaced
//! in place; [`PriceStore::insert_all`] checks every symbol before writing
//! any of them.

use std::collections::{HashMap, HashSet};

use tessera_types::{PriceEntry, Symbol};

use crate::{FeedError, Result};

/// Mapping symbol -> present value.
#[derive(Debug, Clone, Default)]
pub struct PriceStore {
    prices: HashMap<Symbol, u128>,
}

impl PriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &Symbol) -> Option<u128> {
        self.prices.get(symbol).copied()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.prices.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Check that every entry could be inserted, without writing anything.
    ///
    /// # Errors
    ///
    /// [`FeedError::OverwriteConflict`] for the first symbol that is already
    /// present or repeated within `entries`.
    pub fn check_insertable(&self, entries: &[PriceEntry]) -> Result<()> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in entries {
            if self.contains(&entry.symbol) || !seen.insert(entry.symbol) {
                return Err(FeedError::OverwriteConflict {
                    symbol: entry.symbol,
                });
            }
        }
        Ok(())
    }

    /// Insert all entries, or none of them.
    pub fn insert_all(&mut self, entries: &[PriceEntry]) -> Result<()> {
        self.check_insertable(entries)?;
        for entry in entries {
            self.prices.insert(entry.symbol, entry.value);
        }
        Ok(())
    }

    /// Remove `symbol`, returning whether it was present.
    pub fn remove(&mut self, symbol: &Symbol) -> bool {
        self.prices.remove(symbol).is_some()
    }
}
