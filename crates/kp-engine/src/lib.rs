//! # kp-engine — Spin Outcome Engine for the Kokopot slot mini-game
//!
//! Turns a spin request into a three-symbol draw, scores it, awards free
//! spins and keeps the per-player session counters consistent.
//!
//! ## Features
//!
//! - **Weighted Draw**: Integer symbol weights, seedable ChaCha RNG
//! - **Two Rule Variants**: Independent reels with partial pays, or a
//!   guaranteed triple with exact-match scoring
//! - **Free Spins**: Per-game cap, consumed before paid spins, never chained
//! - **Reentrancy Guard**: A spin requested mid-spin is a no-op
//! - **Persistence Port**: Fire-and-forget progress and final-score writes
//!
//! ## Architecture
//!
//! ```text
//! SessionHost
//!     │
//!     ├── SpinEngine
//!     │     ├── EngineConfig (weights, score table, caps, variant)
//!     │     ├── SessionState (spins, free spins, score)
//!     │     └── RuleVariant (draw + evaluate + triggers)
//!     │
//!     └── BackgroundPersister ──> dyn SessionStore
//!                                   ├── MemoryStore
//!                                   └── JsonFileStore (+ Leaderboard)
//!           │
//!           v
//!     SpinOutcome → Spun(SpinResult) | NoOp(reason)
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod leaderboard;
pub mod paytable;
pub mod persister;
pub mod rules;
pub mod session;
pub mod spin;
pub mod store;
pub mod symbols;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use host::*;
pub use leaderboard::*;
pub use paytable::*;
pub use persister::*;
pub use rules::*;
pub use session::*;
pub use spin::*;
pub use store::*;
pub use symbols::*;
