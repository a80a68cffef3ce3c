//! # kp-sim — Batch simulator for the Kokopot spin engine
//!
//! Measures what a configuration actually pays out:
//!
//! - **Draw simulation**: draws and scoring only, no session. Symbol
//!   frequencies, outcome histogram, hit rate, jackpot odds.
//! - **Session simulation**: complete games through [`SpinEngine`] until game
//!   over. Final score spread and free-spin usage.
//!
//! Work is split into fixed-size chunks run on the rayon pool. Each chunk
//! seeds its own ChaCha8 RNG from `seed + chunk index`, so a report depends
//! only on the inputs and never on the thread count.

use std::collections::BTreeMap;

use kp_engine::{ConfigError, EngineConfig, RuleVariant, SpinEngine, SpinOutcome, Symbol, WinKind};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Draws per chunk
pub const DRAW_CHUNK: u64 = 65_536;

/// Games per chunk
pub const GAME_CHUNK: u64 = 256;

/// Simulation errors
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Nothing to simulate: {0} must be greater than zero")]
    Empty(&'static str),
}

// ═══════════════════════════════════════════════════════════════════════════════
// DRAW SIMULATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of [`simulate_draws`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawReport {
    pub config_name: String,
    pub variant: RuleVariant,
    pub spins: u64,
    pub seed: u64,
    /// Symbols seen, counted per reel
    pub symbol_counts: BTreeMap<Symbol, u64>,
    /// Observed share of reels showing each symbol
    pub symbol_frequency: BTreeMap<Symbol, f64>,
    /// Probability implied by the weights
    pub expected_frequency: BTreeMap<Symbol, f64>,
    /// Spins per points value
    pub outcomes: BTreeMap<i32, u64>,
    /// Share of spins with positive points
    pub hit_rate: f64,
    /// Mean points per spin
    pub average_points: f64,
    /// Share of spins scoring a seven triple (wilds included)
    pub jackpot_rate: f64,
    /// Chance of at least one jackpot in a full game of paid spins
    pub jackpot_per_game: f64,
}

impl DrawReport {
    /// Largest |observed - expected| over all symbols
    pub fn max_frequency_error(&self) -> f64 {
        self.expected_frequency
            .iter()
            .map(|(symbol, expected)| {
                let observed = self.symbol_frequency.get(symbol).copied().unwrap_or(0.0);
                (observed - expected).abs()
            })
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Default)]
struct DrawTally {
    spins: u64,
    symbols: BTreeMap<Symbol, u64>,
    outcomes: BTreeMap<i32, u64>,
    hits: u64,
    points: i64,
    jackpots: u64,
}

impl DrawTally {
    fn merge(mut self, other: DrawTally) -> DrawTally {
        self.spins += other.spins;
        for (symbol, count) in other.symbols {
            *self.symbols.entry(symbol).or_default() += count;
        }
        for (points, count) in other.outcomes {
            *self.outcomes.entry(points).or_default() += count;
        }
        self.hits += other.hits;
        self.points += other.points;
        self.jackpots += other.jackpots;
        self
    }
}

fn draw_chunk(config: &EngineConfig, spins: u64, seed: u64) -> DrawTally {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let variant = config.variant;
    let mut tally = DrawTally::default();

    for _ in 0..spins {
        let reels = variant.draw(&config.weights, &mut rng);
        for symbol in reels {
            *tally.symbols.entry(symbol).or_default() += 1;
        }

        let eval = variant.evaluate(&reels, &config.score_table, &config.partial_pays);
        *tally.outcomes.entry(eval.points).or_default() += 1;
        tally.points += eval.points as i64;
        if eval.points > 0 {
            tally.hits += 1;
        }
        if matches!(
            eval.kind,
            WinKind::Triple(Symbol::Seven) | WinKind::WildTriple(Symbol::Seven)
        ) {
            tally.jackpots += 1;
        }
        tally.spins += 1;
    }

    tally
}

/// Draw and score `spins` windows without a session
pub fn simulate_draws(config: &EngineConfig, spins: u64, seed: u64) -> Result<DrawReport, SimError> {
    config.validate()?;
    if spins == 0 {
        return Err(SimError::Empty("spins"));
    }

    let chunks = spins.div_ceil(DRAW_CHUNK);
    log::info!(
        "Simulating {spins} draws of '{}' ({:?}) in {chunks} chunk(s)",
        config.name,
        config.variant
    );

    let tally = (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let len = DRAW_CHUNK.min(spins - chunk * DRAW_CHUNK);
            draw_chunk(config, len, seed.wrapping_add(chunk))
        })
        .reduce(DrawTally::default, DrawTally::merge);

    let reels_seen = (tally.spins * 3) as f64;
    let spins_f = tally.spins as f64;

    let symbol_counts: BTreeMap<Symbol, u64> = Symbol::DRAW_ORDER
        .iter()
        .map(|&s| (s, tally.symbols.get(&s).copied().unwrap_or(0)))
        .collect();
    let symbol_frequency = symbol_counts
        .iter()
        .map(|(&s, &count)| (s, count as f64 / reels_seen))
        .collect();
    let expected_frequency = Symbol::DRAW_ORDER
        .iter()
        .map(|&s| (s, config.weights.probability(s)))
        .collect();

    let jackpot_rate = tally.jackpots as f64 / spins_f;
    let jackpot_per_game = 1.0 - (1.0 - jackpot_rate).powi(config.max_spins as i32);

    Ok(DrawReport {
        config_name: config.name.clone(),
        variant: config.variant,
        spins: tally.spins,
        seed,
        symbol_counts,
        symbol_frequency,
        expected_frequency,
        outcomes: tally.outcomes,
        hit_rate: tally.hits as f64 / spins_f,
        average_points: tally.points as f64 / spins_f,
        jackpot_rate,
        jackpot_per_game,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// SESSION SIMULATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of [`simulate_sessions`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub config_name: String,
    pub variant: RuleVariant,
    pub games: u64,
    pub seed: u64,
    pub mean_score: f64,
    pub min_score: u64,
    pub max_score: u64,
    /// Spins played per game, free spins included
    pub average_spins: f64,
    /// Free spins granted per game
    pub average_free_spins: f64,
    /// Share of games that reached the free-spin cap
    pub free_spin_cap_rate: f64,
}

#[derive(Debug)]
struct GameTally {
    games: u64,
    score_sum: u128,
    min_score: u64,
    max_score: u64,
    spins: u64,
    free_spins: u64,
    capped: u64,
}

impl Default for GameTally {
    fn default() -> Self {
        Self {
            games: 0,
            score_sum: 0,
            min_score: u64::MAX,
            max_score: 0,
            spins: 0,
            free_spins: 0,
            capped: 0,
        }
    }
}

impl GameTally {
    fn merge(self, other: GameTally) -> GameTally {
        GameTally {
            games: self.games + other.games,
            score_sum: self.score_sum + other.score_sum,
            min_score: self.min_score.min(other.min_score),
            max_score: self.max_score.max(other.max_score),
            spins: self.spins + other.spins,
            free_spins: self.free_spins + other.free_spins,
            capped: self.capped + other.capped,
        }
    }
}

fn game_chunk(config: &EngineConfig, games: u64, seed: u64) -> Result<GameTally, SimError> {
    let engine = SpinEngine::new(config.clone().with_seed(seed))?;
    let cap = config.max_free_spins_per_game;
    let mut tally = GameTally::default();

    for _ in 0..games {
        engine.reset();
        let mut spins = 0u64;
        while let SpinOutcome::Spun(_) = engine.spin() {
            spins += 1;
        }

        let state = engine.state();
        tally.games += 1;
        tally.score_sum += state.score as u128;
        tally.min_score = tally.min_score.min(state.score);
        tally.max_score = tally.max_score.max(state.score);
        tally.spins += spins;
        tally.free_spins += state.free_spins_used as u64;
        if cap > 0 && state.free_spins_used >= cap {
            tally.capped += 1;
        }
    }

    Ok(tally)
}

/// Play `games` complete games and summarise the final scores
pub fn simulate_sessions(
    config: &EngineConfig,
    games: u64,
    seed: u64,
) -> Result<SessionReport, SimError> {
    config.validate()?;
    if games == 0 {
        return Err(SimError::Empty("games"));
    }

    let chunks = games.div_ceil(GAME_CHUNK);
    log::info!(
        "Simulating {games} games of '{}' ({:?}) in {chunks} chunk(s)",
        config.name,
        config.variant
    );

    let tally = (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let len = GAME_CHUNK.min(games - chunk * GAME_CHUNK);
            game_chunk(config, len, seed.wrapping_add(chunk))
        })
        .try_reduce(GameTally::default, |a, b| Ok(a.merge(b)))?;

    let games_f = tally.games as f64;

    Ok(SessionReport {
        config_name: config.name.clone(),
        variant: config.variant,
        games: tally.games,
        seed,
        mean_score: tally.score_sum as f64 / games_f,
        min_score: tally.min_score,
        max_score: tally.max_score,
        average_spins: tally.spins as f64 / games_f,
        average_free_spins: tally.free_spins as f64 / games_f,
        free_spin_cap_rate: tally.capped as f64 / games_f,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_counts_rejected() {
        let config = EngineConfig::default();
        assert!(matches!(simulate_draws(&config, 0, 1), Err(SimError::Empty("spins"))));
        assert!(matches!(simulate_sessions(&config, 0, 1), Err(SimError::Empty("games"))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.weights.cherry -= 1;
        assert!(matches!(simulate_draws(&config, 10, 1), Err(SimError::Config(_))));
    }

    #[test]
    fn test_draw_chunks_cover_all_spins() {
        let config = EngineConfig::default();
        let spins = DRAW_CHUNK * 2 + 17;
        let report = simulate_draws(&config, spins, 9).unwrap();
        assert_eq!(report.spins, spins);
        assert_eq!(report.outcomes.values().sum::<u64>(), spins);
        assert_eq!(report.symbol_counts.values().sum::<u64>(), spins * 3);
    }

    #[test]
    fn test_tally_merge() {
        let a = draw_chunk(&EngineConfig::default(), 100, 1);
        let b = draw_chunk(&EngineConfig::default(), 50, 2);
        let merged = a.merge(b);
        assert_eq!(merged.spins, 150);
        assert_eq!(merged.outcomes.values().sum::<u64>(), 150);
    }

    #[test]
    fn test_game_tally_min_max() {
        let tally = game_chunk(&EngineConfig::guaranteed_triple(), 20, 3).unwrap();
        assert_eq!(tally.games, 20);
        assert!(tally.min_score <= tally.max_score);
        assert!(tally.spins >= 20 * 30);
    }
}
