//! Spin Engine Integration Tests
//!
//! Exercises the engine through its public surface:
//! - Weighted draw convergence
//! - Session invariants over full games
//! - Both rule variants end to end
//! - Sharing one engine between threads

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;

use kp_engine::{
    BonusTrigger, EngineConfig, NoOpReason, RuleVariant, SessionState, SpinEngine, SpinOutcome,
    Symbol, SymbolWeights, WinKind,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const GAMES: u64 = 200;

fn play_to_end(engine: &SpinEngine) -> Vec<SessionState> {
    let mut states = vec![engine.state()];
    while let SpinOutcome::Spun(result) = engine.spin() {
        states.push(result.state);
    }
    states
}

// ═══════════════════════════════════════════════════════════════════════════════
// WEIGHTED DRAW
// ═══════════════════════════════════════════════════════════════════════════════

fn assert_converges(weights: SymbolWeights, seed: u64) {
    const DRAWS: usize = 1_000_000;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut counts: HashMap<Symbol, usize> = HashMap::new();

    for _ in 0..DRAWS {
        *counts.entry(weights.sample(&mut rng)).or_default() += 1;
    }

    for symbol in Symbol::DRAW_ORDER {
        let observed = counts.get(&symbol).copied().unwrap_or(0) as f64 / DRAWS as f64;
        let expected = weights.probability(symbol);
        assert!(
            (observed - expected).abs() < 0.01,
            "{symbol}: observed {observed:.4}, expected {expected:.4}"
        );
    }
}

#[test]
fn test_independent_weights_converge() {
    assert_converges(SymbolWeights::independent_reels(), 2024);
}

#[test]
fn test_guaranteed_triple_weights_converge() {
    let weights = SymbolWeights::guaranteed_triple();
    assert_converges(weights, 4048);
    assert!((weights.probability(Symbol::Neg2) - 0.05).abs() < 1e-12);
}

#[test]
fn test_guaranteed_triple_always_triple() {
    let engine = SpinEngine::new(EngineConfig::guaranteed_triple().with_seed(5)).unwrap();
    while let SpinOutcome::Spun(result) = engine.spin() {
        let [a, b, c] = result.reels;
        assert!(a == b && b == c);
        assert_eq!(result.kind, WinKind::Triple(a));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SESSION INVARIANTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_invariants_over_many_games() {
    for variant in [RuleVariant::IndependentReels, RuleVariant::GuaranteedTriple] {
        for game in 0..GAMES {
            let config = EngineConfig::for_variant(variant).with_seed(game);
            let cap = config.max_free_spins_per_game;
            let engine = SpinEngine::new(config).unwrap();

            let states = play_to_end(&engine);
            for pair in states.windows(2) {
                let (before, after) = (pair[0], pair[1]);
                assert!(after.spins_left <= before.spins_left);
                assert!(after.free_spins_used <= cap);
                assert!(after.free_spins_used >= before.free_spins_used);
            }

            let last = *states.last().unwrap();
            assert!(last.is_game_over());
            assert_eq!(last.spins_left, 0);
            assert_eq!(last.free_spins, 0);

            // Every paid turn plus every granted free spin was played
            assert_eq!(states.len() - 1, (30 + last.free_spins_used) as usize);
        }
    }
}

#[test]
fn test_score_never_negative_under_penalties() {
    let engine = SpinEngine::new(EngineConfig::independent_reels().with_seed(1)).unwrap();
    for _ in 0..30 {
        let result = engine
            .spin_forced([Symbol::Neg1, Symbol::Cherry, Symbol::Bell])
            .into_result()
            .unwrap();
        assert_eq!(result.points, -15);
        assert_eq!(result.state.score, 0);
    }
    assert!(engine.is_game_over());
}

#[test]
fn test_terminal_spin_is_idempotent() {
    let engine = SpinEngine::new(EngineConfig::default().with_seed(3)).unwrap();
    play_to_end(&engine);
    let frozen = engine.state();
    let count = engine.spin_count();

    for _ in 0..10 {
        assert_eq!(engine.spin(), SpinOutcome::NoOp(NoOpReason::GameOver));
    }
    assert_eq!(engine.state(), frozen);
    assert_eq!(engine.spin_count(), count);
}

#[test]
fn test_reset_from_any_state() {
    let engine = SpinEngine::new(EngineConfig::default().with_seed(8)).unwrap();
    for n in [0, 1, 7, 45] {
        engine.reset();
        for _ in 0..n {
            engine.spin();
        }
        engine.reset();
        engine.reset();
        assert_eq!(engine.state(), SessionState::new(30));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCENARIOS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_guaranteed_triple_scenarios() {
    let engine = SpinEngine::new(EngineConfig::guaranteed_triple()).unwrap();

    let seven = engine.spin_forced([Symbol::Seven; 3]).into_result().unwrap();
    assert_eq!(seven.points, 300);
    assert_eq!(seven.free_spins_awarded, 0);

    let diamond = engine.spin_forced([Symbol::Diamond; 3]).into_result().unwrap();
    assert_eq!(diamond.points, 150);
    assert_eq!(diamond.free_spins_awarded, 1);
    assert_eq!(diamond.state.free_spins, 1);
    assert_eq!(diamond.state.score, 450);
}

#[test]
fn test_independent_reels_scenarios() {
    let engine = SpinEngine::new(EngineConfig::independent_reels()).unwrap();

    let wild = engine
        .spin_forced([Symbol::Seven, Symbol::Star, Symbol::Seven])
        .into_result()
        .unwrap();
    assert_eq!(wild.kind, WinKind::WildTriple(Symbol::Seven));
    assert_eq!(wild.points, 300);
    assert_eq!(wild.triggers, vec![BonusTrigger::CenterWild]);
    assert_eq!(wild.free_spins_awarded, 1);

    // The free spin is consumed first and does not chain
    let free = engine
        .spin_forced([Symbol::Diamond, Symbol::Star, Symbol::Diamond])
        .into_result()
        .unwrap();
    assert!(free.was_free_spin);
    assert_eq!(free.free_spins_awarded, 0);
    assert_eq!(free.state.spins_left, 29);

    let pair = engine
        .spin_forced([Symbol::Bell, Symbol::Bell, Symbol::Cherry])
        .into_result()
        .unwrap();
    assert_eq!(pair.kind, WinKind::Pair(Symbol::Bell));
    assert_eq!(pair.points, 8);
}

#[test]
fn test_free_spin_cap_per_game() {
    let engine = SpinEngine::new(EngineConfig::guaranteed_triple()).unwrap();
    let mut granted = 0;
    for _ in 0..8 {
        // Only paid turns award, so burn the banked free spins in between
        let result = engine.spin_forced([Symbol::Star; 3]).into_result().unwrap();
        granted += result.free_spins_awarded;
        while engine.state().free_spins > 0 {
            engine.spin_forced([Symbol::Cherry; 3]);
        }
    }
    assert_eq!(granted, 10);
    assert_eq!(engine.state().free_spins_used, 10);
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONCURRENCY
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_shared_engine_never_double_spends() {
    let engine = Arc::new(SpinEngine::new(EngineConfig::default().with_seed(77)).unwrap());
    let spun = Arc::new(AtomicU32::new(0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            let spun = spun.clone();
            thread::spawn(move || {
                while !engine.is_game_over() {
                    if let SpinOutcome::Spun(_) = engine.spin() {
                        spun.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let state = engine.state();
    assert!(state.is_game_over());
    assert_eq!(spun.load(Ordering::Relaxed), 30 + state.free_spins_used);
    assert_eq!(engine.spin_count(), spun.load(Ordering::Relaxed) as u64);
}
