//! Engine configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paytable::{PartialPays, ScoreTable};
use crate::rules::RuleVariant;
use crate::symbols::SymbolWeights;

/// Weights of a reel must cover the whole roll range
pub const WEIGHT_TOTAL: u32 = crate::symbols::ROLL_RANGE;

/// Largest accepted weight total
pub const MAX_WEIGHT_TOTAL: u64 = u32::MAX as u64;

/// Paid spins per game
pub const DEFAULT_MAX_SPINS: u32 = 30;

/// Free spins that can be granted per game
pub const DEFAULT_MAX_FREE_SPINS: u32 = 10;

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Config name for logs and reports
    #[serde(default = "default_name")]
    pub name: String,
    /// Rule set played by the engine
    #[serde(default)]
    pub variant: RuleVariant,
    /// Per-reel symbol weights
    pub weights: SymbolWeights,
    /// Triple values
    #[serde(default)]
    pub score_table: ScoreTable,
    /// Partial-match values (independent reels only)
    #[serde(default)]
    pub partial_pays: PartialPays,
    /// Paid spins at session start and after reset
    #[serde(default = "default_max_spins")]
    pub max_spins: u32,
    /// Cap on free spins granted per game
    #[serde(default = "default_max_free_spins")]
    pub max_free_spins_per_game: u32,
    /// Fixed RNG seed (None = seeded from the OS)
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_name() -> String {
    "Kokopot".into()
}

fn default_max_spins() -> u32 {
    DEFAULT_MAX_SPINS
}

fn default_max_free_spins() -> u32 {
    DEFAULT_MAX_FREE_SPINS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::independent_reels()
    }
}

impl EngineConfig {
    /// Independent reels with wild and partial scoring
    pub fn independent_reels() -> Self {
        Self {
            name: default_name(),
            variant: RuleVariant::IndependentReels,
            weights: SymbolWeights::independent_reels(),
            score_table: ScoreTable::standard(),
            partial_pays: PartialPays::standard(),
            max_spins: DEFAULT_MAX_SPINS,
            max_free_spins_per_game: DEFAULT_MAX_FREE_SPINS,
            seed: None,
        }
    }

    /// Every spin a triple, exact scoring only
    pub fn guaranteed_triple() -> Self {
        Self {
            name: "Kokopot Triples".into(),
            variant: RuleVariant::GuaranteedTriple,
            weights: SymbolWeights::guaranteed_triple(),
            ..Self::independent_reels()
        }
    }

    /// Preset for a variant
    pub fn for_variant(variant: RuleVariant) -> Self {
        match variant {
            RuleVariant::IndependentReels => Self::independent_reels(),
            RuleVariant::GuaranteedTriple => Self::guaranteed_triple(),
        }
    }

    /// Builder: fix the RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check invariants the engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let total = self.weights.total();
        let required = u64::from(WEIGHT_TOTAL);
        if total < required || total > MAX_WEIGHT_TOTAL {
            return Err(ConfigError::InvalidWeights {
                min: required,
                max: MAX_WEIGHT_TOTAL,
                actual: total,
            });
        }
        if total > required {
            log::warn!(
                "Weights of '{}' add up to {total}; the last {} are never drawn",
                self.name,
                total - required
            );
        }

        // Every drawable symbol needs a triple value
        if let Some((symbol, _)) = self
            .weights
            .iter()
            .find(|&(s, w)| w > 0 && self.score_table.triple(s).is_none())
        {
            return Err(ConfigError::MissingScore(symbol));
        }

        if self.max_spins == 0 {
            return Err(ConfigError::InvalidLimit("max_spins must be positive"));
        }

        Ok(())
    }

    /// Parse and validate JSON
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        let text = std::fs::read_to_string(path)?;

        let config = match extension.as_str() {
            "json" => Self::from_json_str(&text)?,
            "yaml" | "yml" => Self::from_yaml_str(&text)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        log::info!("Loaded engine config '{}' from {}", config.name, path.display());
        Ok(config)
    }

    /// Export as pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Symbol;

    #[test]
    fn test_presets_validate() {
        assert!(EngineConfig::independent_reels().validate().is_ok());
        assert!(EngineConfig::guaranteed_triple().validate().is_ok());
        assert_eq!(EngineConfig::default().variant, RuleVariant::IndependentReels);
    }

    #[test]
    fn test_invalid_weights() {
        let mut config = EngineConfig::default();
        config.weights.cherry -= 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWeights { min: 100, actual: 99, .. })
        ));

        // Overshoot only loses the tail
        config.weights.cherry += 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_huge_weights_rejected_without_overflow() {
        let json = r#"{
            "weights": { "seven": 4294967295, "diamond": 10, "bell": 12, "cherry": 44,
                         "star": 4, "neg1": 6, "neg2": 6 }
        }"#;
        let result = std::panic::catch_unwind(|| EngineConfig::from_json_str(json).map(|_| ()));
        let Ok(result) = result else {
            panic!("validating huge weights panicked");
        };
        assert!(matches!(
            result,
            Err(ConfigError::InvalidWeights { actual: 4_294_967_377, .. })
        ));

        // A single maximal weight still fits and draws only that symbol
        let config = EngineConfig {
            weights: SymbolWeights {
                seven: u32::MAX,
                diamond: 0,
                bell: 0,
                cherry: 0,
                star: 0,
                neg1: 0,
                neg2: 0,
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.weights.select(99), Symbol::Seven);
        assert_eq!(config.weights.probability(Symbol::Seven), 1.0);
    }

    #[test]
    fn test_missing_score_for_drawable_symbol() {
        let mut config = EngineConfig::default();
        config.score_table = ScoreTable::empty()
            .with_triple(Symbol::Seven, 300)
            .with_triple(Symbol::Diamond, 150);
        assert!(matches!(config.validate(), Err(ConfigError::MissingScore(Symbol::Bell))));
    }

    #[test]
    fn test_zero_max_spins_rejected() {
        let config = EngineConfig {
            max_spins: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLimit(_))));
    }

    #[test]
    fn test_json_roundtrip_with_defaults() {
        let json = r#"{
            "variant": "guaranteed_triple",
            "weights": { "seven": 8, "diamond": 12, "bell": 15, "cherry": 35,
                         "star": 15, "neg1": 10, "neg2": 10 }
        }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.variant, RuleVariant::GuaranteedTriple);
        assert_eq!(config.max_spins, 30);
        assert_eq!(config.max_free_spins_per_game, 10);
        assert_eq!(config.score_table, ScoreTable::standard());

        let exported = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json_str(&exported).unwrap(), config);
    }

    #[test]
    fn test_yaml_config() {
        let yaml = "
variant: independent_reels
weights:
  seven: 18
  diamond: 10
  bell: 12
  cherry: 44
  star: 4
  neg1: 6
  neg2: 6
max_free_spins_per_game: 4
seed: 42
";
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.max_free_spins_per_game, 4);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.weights, SymbolWeights::independent_reels());
    }

    #[test]
    fn test_unsupported_extension() {
        let path = std::env::temp_dir().join(format!("kp_config_{}.toml", std::process::id()));
        std::fs::write(&path, "x = 1").unwrap();
        let result = EngineConfig::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
