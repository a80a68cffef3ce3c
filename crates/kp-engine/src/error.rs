//! Error types

use crate::symbols::Symbol;

/// Engine configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Symbol weights must add up to between {min} and {max}, got {actual}")]
    InvalidWeights { min: u64, max: u64, actual: u64 },

    #[error("Score table has no triple entry for {0}")]
    MissingScore(Symbol),

    #[error("Invalid limit: {0}")]
    InvalidLimit(&'static str),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),
}

/// Persistence collaborator errors
///
/// These never reach the engine; hosts log and drop them.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Persist queue full")]
    QueueFull,

    #[error("Persister stopped")]
    Stopped,
}

/// Errors opening a session host
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),
}
