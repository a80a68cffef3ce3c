//! Score tables

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::symbols::Symbol;

/// Points for three identical symbols
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreTable {
    triples: BTreeMap<Symbol, i32>,
}

impl ScoreTable {
    /// Empty table (every spin scores nothing)
    pub fn empty() -> Self {
        Self {
            triples: BTreeMap::new(),
        }
    }

    /// Standard table
    pub fn standard() -> Self {
        Self::empty()
            .with_triple(Symbol::Seven, 300)
            .with_triple(Symbol::Star, 270)
            .with_triple(Symbol::Diamond, 150)
            .with_triple(Symbol::Bell, 100)
            .with_triple(Symbol::Cherry, 40)
            .with_triple(Symbol::Neg1, -25)
            .with_triple(Symbol::Neg2, -10)
    }

    /// Builder: set the value of a triple
    pub fn with_triple(mut self, symbol: Symbol, points: i32) -> Self {
        self.triples.insert(symbol, points);
        self
    }

    /// Value of `symbol × 3`, if defined
    pub fn triple(&self, symbol: Symbol) -> Option<i32> {
        self.triples.get(&symbol).copied()
    }

    /// Exact-match lookup: only all-identical windows have an entry
    pub fn lookup(&self, reels: &[Symbol; 3]) -> Option<i32> {
        let [a, b, c] = *reels;
        if a == b && b == c {
            self.triple(a)
        } else {
            None
        }
    }

    /// Symbols that have no triple entry
    pub fn missing(&self) -> Vec<Symbol> {
        Symbol::DRAW_ORDER
            .iter()
            .copied()
            .filter(|s| !self.triples.contains_key(s))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Partial-match values for the independent-reels rules
///
/// Applied in order after exact and wild matches fail: penalty presence
/// first, then "pair plus one other".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialPays {
    /// Any `neg1` on the reels
    pub neg1_present: i32,
    /// Any `neg2` on the reels (checked after `neg1`)
    pub neg2_present: i32,
    /// Value of a pair, by symbol
    pub pairs: BTreeMap<Symbol, i32>,
    /// Pair whose symbol has no positive value
    pub default_pair: i32,
}

impl PartialPays {
    pub fn standard() -> Self {
        let pairs = BTreeMap::from([
            (Symbol::Seven, 20),
            (Symbol::Diamond, 10),
            (Symbol::Bell, 8),
            (Symbol::Cherry, 3),
            (Symbol::Neg1, -15),
            (Symbol::Neg2, -5),
        ]);
        Self {
            neg1_present: -15,
            neg2_present: -8,
            pairs,
            default_pair: 15,
        }
    }

    /// Value of a pair of `symbol`
    ///
    /// Penalty pairs keep their (negative) table value. Any other symbol
    /// without a positive value pays `default_pair`.
    pub fn pair(&self, symbol: Symbol) -> i32 {
        let value = self.pairs.get(&symbol).copied().unwrap_or(0);
        if symbol.is_penalty() {
            return value;
        }
        if value > 0 { value } else { self.default_pair }
    }
}

impl Default for PartialPays {
    fn default() -> Self {
        Self::standard()
    }
}
