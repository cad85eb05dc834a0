//! Notifications broadcast to rendering/audio collaborators
//!
//! The engine publishes these over a `tokio::sync::broadcast` channel;
//! presenters subscribe through `GameHandle::subscribe`. Nothing in the core
//! waits on a consumer.

use uuid::Uuid;

use super::entities::PowerUpKind;

/// Audio cue taxonomy, fire-and-forget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    Hit,
    Miss,
    PowerUp,
    LevelUp,
    GameOver,
}

/// Events emitted by the game loop
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// A fresh run began
    Started { high_score: u64 },
    Paused,
    Resumed,

    /// Create a falling entity with the given fall duration
    LetterSpawned {
        id: Uuid,
        character: char,
        color: &'static str,
        fall_ms: u64,
    },
    /// Rewrite an in-flight letter's fall duration (slow motion)
    LetterRetimed { id: Uuid, fall_ms: u64 },
    /// Letter matched by input: particle burst + `+points` popup at the
    /// entity's last known position
    LetterHit {
        id: Uuid,
        character: char,
        color: &'static str,
        points: u64,
        score: u64,
        combo: u32,
    },
    /// Letter reached the bottom unhandled: screen shake
    LetterMissed { id: Uuid, character: char, lives: u8 },
    /// Letter destroyed by ClearLetters: hit-style particles, no combo
    LetterCleared {
        id: Uuid,
        character: char,
        color: &'static str,
    },
    /// Flat bonus popup for a ClearLetters detonation
    ClearBonus {
        destroyed: usize,
        bonus: u64,
        score: u64,
    },

    PowerUpSpawned {
        id: Uuid,
        kind: PowerUpKind,
        fall_ms: u64,
    },
    /// Popup shows the effect's glyph; `lives` reflects the applied effect
    PowerUpCollected {
        id: Uuid,
        kind: PowerUpKind,
        lives: u8,
    },
    /// Uncollected power-up left the play area (no penalty)
    PowerUpExpired { id: Uuid },
    /// Slow-motion window ended; applies to subsequent spawns only
    SlowMotionEnded { fall_ms: u64 },

    LevelUp {
        level: u32,
        fall_ms: u64,
        spawn_ms: u64,
        power_up_chance: f64,
    },
    GameOver {
        score: u64,
        level: u32,
        max_combo: u32,
        high_score: u64,
        new_record: bool,
    },
}

impl GameEvent {
    /// Audio cue for this event, if any
    pub fn sound(&self) -> Option<SoundKind> {
        match self {
            GameEvent::LetterHit { .. } => Some(SoundKind::Hit),
            GameEvent::LetterMissed { .. } => Some(SoundKind::Miss),
            GameEvent::PowerUpCollected { .. } => Some(SoundKind::PowerUp),
            GameEvent::LevelUp { .. } => Some(SoundKind::LevelUp),
            GameEvent::GameOver { .. } => Some(SoundKind::GameOver),
            _ => None,
        }
    }
}
