//! Letterfall - real-time falling-letter reflex game core
//!
//! Letters drop down the play area; the player must press the matching key
//! before each one reaches the bottom. Hits score with a combo multiplier,
//! misses cost lives, and collectible power-ups bend the rules. This crate is
//! the authoritative engine: spawn scheduling, difficulty progression, hit
//! resolution, power-up effects, and the Idle/Running/Paused/Over state
//! machine. Rendering, audio, and input are collaborators on the other side
//! of a [`GameHandle`]: they feed input and lifecycle callbacks in, and
//! subscribe to the [`GameEvent`] stream coming out.
//!
//! Finished runs settle a locally persisted high score and are submitted,
//! fire-and-forget, to a shared Supabase leaderboard.

pub mod config;
pub mod engine;
pub mod store;

pub use config::Config;
pub use engine::{
    ActivePowerUp, FallingLetter, Game, GameEvent, GameHandle, GamePhase, GameState, PowerUpKind,
    Services, SoundKind, Tuning,
};
pub use store::{HighScoreFile, ScoreboardStore, SupabaseClient};
