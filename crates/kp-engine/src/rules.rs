//! Rule variants: how reels are drawn, scored and how free spins are earned
//!
//! Two rule sets exist and an engine runs exactly one of them:
//!
//! - [`RuleVariant::IndependentReels`]: three independent weighted draws,
//!   scored by exact triple, wild substitution, penalty presence and
//!   pair-plus-one, in that order.
//! - [`RuleVariant::GuaranteedTriple`]: one weighted draw copied to all
//!   three reels, scored by exact triple only.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::paytable::{PartialPays, ScoreTable};
use crate::symbols::{Symbol, SymbolWeights};

/// Which rule set an engine plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleVariant {
    /// Independent reels with wild and partial-match scoring
    #[default]
    IndependentReels,
    /// Every spin is a triple of one drawn symbol
    GuaranteedTriple,
}

/// How a window scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "symbol")]
pub enum WinKind {
    /// Three identical symbols
    Triple(Symbol),
    /// Triple completed by one or two wilds
    WildTriple(Symbol),
    /// Penalty symbol present on the reels
    Penalty(Symbol),
    /// Two of a kind plus one other
    Pair(Symbol),
    /// Nothing matched
    Nothing,
}

/// Scoring outcome of a single window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub points: i32,
    pub kind: WinKind,
}

impl Evaluation {
    fn new(points: i32, kind: WinKind) -> Self {
        Self { points, kind }
    }

    fn nothing() -> Self {
        Self::new(0, WinKind::Nothing)
    }
}

/// Free-spin award condition met by a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusTrigger {
    /// Two or more diamonds (independent reels)
    DoubleDiamond,
    /// Star on the center reel (independent reels)
    CenterWild,
    /// Three diamonds (guaranteed triple)
    TripleDiamond,
    /// Three stars (guaranteed triple)
    TripleStar,
}

impl BonusTrigger {
    /// Free spins this trigger is worth before the per-game cap
    pub fn spins(self) -> u32 {
        match self {
            BonusTrigger::DoubleDiamond
            | BonusTrigger::CenterWild
            | BonusTrigger::TripleDiamond => 1,
            BonusTrigger::TripleStar => 2,
        }
    }
}

impl RuleVariant {
    /// Draw a window of three reels
    pub fn draw<R: Rng + ?Sized>(self, weights: &SymbolWeights, rng: &mut R) -> [Symbol; 3] {
        match self {
            RuleVariant::IndependentReels => [
                weights.sample(rng),
                weights.sample(rng),
                weights.sample(rng),
            ],
            RuleVariant::GuaranteedTriple => [weights.sample(rng); 3],
        }
    }

    /// Score a window
    pub fn evaluate(
        self,
        reels: &[Symbol; 3],
        table: &ScoreTable,
        partial: &PartialPays,
    ) -> Evaluation {
        match self {
            RuleVariant::IndependentReels => evaluate_independent(reels, table, partial),
            RuleVariant::GuaranteedTriple => table
                .lookup(reels)
                .map(|points| Evaluation::new(points, WinKind::Triple(reels[0])))
                .unwrap_or_else(Evaluation::nothing),
        }
    }

    /// Free-spin conditions met by a window (cap not applied)
    pub fn free_spin_triggers(self, reels: &[Symbol; 3]) -> Vec<BonusTrigger> {
        let mut triggers = Vec::new();
        match self {
            RuleVariant::IndependentReels => {
                if count_of(reels, Symbol::Diamond) >= 2 {
                    triggers.push(BonusTrigger::DoubleDiamond);
                }
                if reels[1] == Symbol::Star {
                    triggers.push(BonusTrigger::CenterWild);
                }
            }
            RuleVariant::GuaranteedTriple => {
                if count_of(reels, Symbol::Diamond) == 3 {
                    triggers.push(BonusTrigger::TripleDiamond);
                }
                if count_of(reels, Symbol::Star) == 3 {
                    triggers.push(BonusTrigger::TripleStar);
                }
            }
        }
        triggers
    }

    /// Total free spins a window is worth before the cap
    pub fn free_spins_for(self, reels: &[Symbol; 3]) -> u32 {
        self.free_spin_triggers(reels)
            .iter()
            .map(|t| t.spins())
            .sum()
    }
}

fn count_of(reels: &[Symbol; 3], symbol: Symbol) -> usize {
    reels.iter().filter(|&&s| s == symbol).count()
}

/// Distinct symbols with their counts, in order of first appearance
fn counts_in_order<'a>(symbols: impl Iterator<Item = &'a Symbol>) -> Vec<(Symbol, usize)> {
    let mut counts: Vec<(Symbol, usize)> = Vec::with_capacity(3);
    for &symbol in symbols {
        match counts.iter_mut().find(|(s, _)| *s == symbol) {
            Some((_, count)) => *count += 1,
            None => counts.push((symbol, 1)),
        }
    }
    counts
}

fn evaluate_independent(
    reels: &[Symbol; 3],
    table: &ScoreTable,
    partial: &PartialPays,
) -> Evaluation {
    if let Some(points) = table.lookup(reels) {
        return Evaluation::new(points, WinKind::Triple(reels[0]));
    }

    // Wild substitution: one or two stars completing a triple
    let wilds = count_of(reels, Symbol::Star);
    if wilds > 0 && wilds < reels.len() {
        let others = counts_in_order(reels.iter().filter(|s| !s.is_wild()));
        for (symbol, count) in others {
            if count + wilds >= 3 {
                if let Some(points) = table.triple(symbol) {
                    return Evaluation::new(points, WinKind::WildTriple(symbol));
                }
            }
        }
    }

    if reels.contains(&Symbol::Neg1) {
        return Evaluation::new(partial.neg1_present, WinKind::Penalty(Symbol::Neg1));
    }
    if reels.contains(&Symbol::Neg2) {
        return Evaluation::new(partial.neg2_present, WinKind::Penalty(Symbol::Neg2));
    }

    // Two of a kind plus one other
    let counts = counts_in_order(reels.iter());
    let has_single = counts.iter().any(|&(_, c)| c == 1);
    if let Some(&(pair, _)) = counts.iter().find(|&&(_, c)| c == 2) {
        if has_single {
            return Evaluation::new(partial.pair(pair), WinKind::Pair(pair));
        }
    }

    Evaluation::nothing()
}

#[cfg(test)]
mod tests {
    use super::*;
    use Symbol::*;

    fn score_a(reels: [Symbol; 3]) -> Evaluation {
        RuleVariant::IndependentReels.evaluate(
            &reels,
            &ScoreTable::standard(),
            &PartialPays::standard(),
        )
    }

    fn score_b(reels: [Symbol; 3]) -> Evaluation {
        RuleVariant::GuaranteedTriple.evaluate(
            &reels,
            &ScoreTable::standard(),
            &PartialPays::standard(),
        )
    }

    #[test]
    fn test_exact_triples() {
        assert_eq!(score_a([Seven, Seven, Seven]), Evaluation::new(300, WinKind::Triple(Seven)));
        assert_eq!(score_a([Star, Star, Star]).points, 270);
        assert_eq!(score_a([Neg2, Neg2, Neg2]).points, -10);
    }

    #[test]
    fn test_wild_substitution() {
        assert_eq!(
            score_a([Seven, Star, Seven]),
            Evaluation::new(300, WinKind::WildTriple(Seven))
        );
        assert_eq!(
            score_a([Star, Bell, Star]),
            Evaluation::new(100, WinKind::WildTriple(Bell))
        );
        // Wilds complete penalty triples too
        assert_eq!(score_a([Star, Star, Neg1]).points, -25);
    }

    #[test]
    fn test_single_wild_without_pair_falls_through() {
        // One star, two different symbols: no triple, no penalty, no pair
        assert_eq!(score_a([Star, Seven, Cherry]), Evaluation::nothing());
    }

    #[test]
    fn test_penalty_presence() {
        assert_eq!(
            score_a([Seven, Seven, Neg1]),
            Evaluation::new(-15, WinKind::Penalty(Neg1))
        );
        assert_eq!(
            score_a([Neg2, Bell, Cherry]),
            Evaluation::new(-8, WinKind::Penalty(Neg2))
        );
        // neg1 wins over neg2
        assert_eq!(score_a([Neg2, Neg1, Neg2]).points, -15);
    }

    #[test]
    fn test_pairs() {
        assert_eq!(score_a([Seven, Bell, Seven]), Evaluation::new(20, WinKind::Pair(Seven)));
        assert_eq!(score_a([Diamond, Diamond, Cherry]).points, 10);
        assert_eq!(score_a([Bell, Cherry, Bell]).points, 8);
        assert_eq!(score_a([Cherry, Cherry, Seven]).points, 3);
    }

    #[test]
    fn test_pair_of_unvalued_symbol_pays_default() {
        let table = ScoreTable::standard();
        let mut partial = PartialPays::standard();
        partial.pairs.remove(&Bell);
        let eval = RuleVariant::IndependentReels.evaluate(&[Bell, Bell, Seven], &table, &partial);
        assert_eq!(eval, Evaluation::new(15, WinKind::Pair(Bell)));
    }

    #[test]
    fn test_all_different() {
        assert_eq!(score_a([Seven, Diamond, Bell]), Evaluation::nothing());
    }

    #[test]
    fn test_guaranteed_triple_exact_only() {
        assert_eq!(score_b([Seven, Seven, Seven]).points, 300);
        assert_eq!(score_b([Diamond, Diamond, Diamond]).points, 150);
        // No partial scoring under this variant
        assert_eq!(score_b([Seven, Star, Seven]), Evaluation::nothing());
        assert_eq!(score_b([Neg1, Bell, Cherry]), Evaluation::nothing());
    }

    #[test]
    fn test_guaranteed_triple_missing_entry_scores_zero() {
        let table = ScoreTable::empty().with_triple(Seven, 300);
        let eval = RuleVariant::GuaranteedTriple.evaluate(
            &[Bell, Bell, Bell],
            &table,
            &PartialPays::standard(),
        );
        assert_eq!(eval, Evaluation::nothing());
    }

    #[test]
    fn test_independent_free_spin_triggers() {
        let v = RuleVariant::IndependentReels;
        assert_eq!(v.free_spin_triggers(&[Diamond, Bell, Diamond]), vec![BonusTrigger::DoubleDiamond]);
        assert_eq!(v.free_spin_triggers(&[Bell, Star, Cherry]), vec![BonusTrigger::CenterWild]);
        assert_eq!(v.free_spins_for(&[Diamond, Star, Diamond]), 2);
        assert_eq!(v.free_spins_for(&[Star, Bell, Star]), 0);
    }

    #[test]
    fn test_triple_free_spin_triggers() {
        let v = RuleVariant::GuaranteedTriple;
        assert_eq!(v.free_spins_for(&[Diamond, Diamond, Diamond]), 1);
        assert_eq!(v.free_spins_for(&[Star, Star, Star]), 2);
        assert_eq!(v.free_spins_for(&[Seven, Seven, Seven]), 0);
        assert_eq!(v.free_spins_for(&[Diamond, Diamond, Bell]), 0);
    }

    #[test]
    fn test_guaranteed_triple_draw_replicates() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(99);
        let weights = SymbolWeights::guaranteed_triple();
        for _ in 0..200 {
            let [a, b, c] = RuleVariant::GuaranteedTriple.draw(&weights, &mut rng);
            assert!(a == b && b == c);
        }
    }
}
