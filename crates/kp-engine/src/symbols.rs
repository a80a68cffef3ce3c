//! Symbol alphabet and per-reel weights

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One of the seven reel symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    Seven,
    Diamond,
    Bell,
    Cherry,
    /// Wild - substitutes for any other symbol (independent-reels rules only)
    Star,
    /// Heavy penalty symbol
    Neg1,
    /// Light penalty symbol
    Neg2,
}

impl Symbol {
    /// Enumeration order used by the cumulative weight walk
    pub const DRAW_ORDER: [Symbol; 7] = [
        Symbol::Seven,
        Symbol::Diamond,
        Symbol::Bell,
        Symbol::Cherry,
        Symbol::Star,
        Symbol::Neg1,
        Symbol::Neg2,
    ];

    /// Canonical lower-case name
    pub fn name(self) -> &'static str {
        match self {
            Symbol::Seven => "seven",
            Symbol::Diamond => "diamond",
            Symbol::Bell => "bell",
            Symbol::Cherry => "cherry",
            Symbol::Star => "star",
            Symbol::Neg1 => "neg1",
            Symbol::Neg2 => "neg2",
        }
    }

    /// Is this the wild symbol?
    pub fn is_wild(self) -> bool {
        self == Symbol::Star
    }

    /// Is this one of the "bad" symbols?
    pub fn is_penalty(self) -> bool {
        matches!(self, Symbol::Neg1 | Symbol::Neg2)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown symbol name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown symbol: {0}")]
pub struct UnknownSymbol(pub String);

impl FromStr for Symbol {
    type Err = UnknownSymbol;

    /// Accepts canonical names and the Spanish names of the web client
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seven" | "siete" => Ok(Symbol::Seven),
            "diamond" | "diamante" => Ok(Symbol::Diamond),
            "bell" | "campana" => Ok(Symbol::Bell),
            "cherry" | "cereza" => Ok(Symbol::Cherry),
            "star" | "wild" | "estrella" => Ok(Symbol::Star),
            "neg1" | "negativo1" => Ok(Symbol::Neg1),
            "neg2" | "negativo2" => Ok(Symbol::Neg2),
            _ => Err(UnknownSymbol(s.to_string())),
        }
    }
}

/// Rolls are drawn uniformly from `[0, ROLL_RANGE)`
pub const ROLL_RANGE: u32 = 100;

/// Categorical weights for a single reel
///
/// Field order matches [`Symbol::DRAW_ORDER`], so a serialized config reads
/// in the same order the sampler walks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolWeights {
    pub seven: u32,
    pub diamond: u32,
    pub bell: u32,
    pub cherry: u32,
    pub star: u32,
    pub neg1: u32,
    pub neg2: u32,
}

impl SymbolWeights {
    /// Weights shipped with the independent-reels game
    pub fn independent_reels() -> Self {
        Self {
            seven: 18,
            diamond: 10,
            bell: 12,
            cherry: 44,
            star: 4,
            neg1: 6,
            neg2: 6,
        }
    }

    /// Weights used by the guaranteed-triple game
    ///
    /// These add up to 105; the last 5 points of neg2 lie past the roll range
    /// and are never drawn, so neg2 comes up 5% of the time.
    pub fn guaranteed_triple() -> Self {
        Self {
            seven: 8,
            diamond: 12,
            bell: 15,
            cherry: 35,
            star: 15,
            neg1: 10,
            neg2: 10,
        }
    }

    /// Weight of a single symbol
    pub fn weight(&self, symbol: Symbol) -> u32 {
        match symbol {
            Symbol::Seven => self.seven,
            Symbol::Diamond => self.diamond,
            Symbol::Bell => self.bell,
            Symbol::Cherry => self.cherry,
            Symbol::Star => self.star,
            Symbol::Neg1 => self.neg1,
            Symbol::Neg2 => self.neg2,
        }
    }

    /// Iterate `(symbol, weight)` in draw order
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, u32)> + '_ {
        Symbol::DRAW_ORDER.iter().map(move |&s| (s, self.weight(s)))
    }

    /// Sum of all weights
    ///
    /// Added in `u64`, so no table of `u32` weights can overflow it.
    pub fn total(&self) -> u64 {
        self.iter().map(|(_, w)| u64::from(w)).sum()
    }

    /// Part of a symbol's weight a roll can actually reach
    ///
    /// Rolls are always in `[0, ROLL_RANGE)`, so weight running past the end
    /// of that range is never drawn.
    pub fn reachable_weight(&self, symbol: Symbol) -> u32 {
        let range = u64::from(ROLL_RANGE);
        let mut start = 0u64;
        for (s, weight) in self.iter() {
            let end = start + u64::from(weight);
            if s == symbol {
                // Both ends are clamped to the roll range, so this fits in u32
                return (end.min(range) - start.min(range)) as u32;
            }
            start = end;
        }
        0
    }

    /// Probability of drawing a symbol
    pub fn probability(&self, symbol: Symbol) -> f64 {
        let mut weight = self.reachable_weight(symbol);
        if symbol == Symbol::Cherry {
            // Rolls past the end of a short table land on cherry
            weight += u64::from(ROLL_RANGE).saturating_sub(self.total()) as u32;
        }
        weight as f64 / ROLL_RANGE as f64
    }

    /// Cumulative-threshold selection for a roll `r` in `[0, ROLL_RANGE)`
    ///
    /// Returns the first symbol whose running total exceeds `r`. A roll past
    /// the end of the table lands on cherry.
    pub fn select(&self, r: u32) -> Symbol {
        let r = u64::from(r);
        let mut cumulative = 0u64;
        for (symbol, weight) in self.iter() {
            cumulative += u64::from(weight);
            if r < cumulative {
                return symbol;
            }
        }
        Symbol::Cherry
    }

    /// Draw one symbol
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Symbol {
        self.select(rng.random_range(0..ROLL_RANGE))
    }
}

impl Default for SymbolWeights {
    fn default() -> Self {
        Self::independent_reels()
    }
}
