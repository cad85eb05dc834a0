//! Falling entities - letters and power-ups

use rand::Rng;
use uuid::Uuid;

/// The 26 characters a falling letter can carry
pub const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Display palette for falling letters (cosmetic, passed through to rendering)
pub const PALETTE: [&str; 6] = [
    "#00ffaa", "#ff6b9d", "#ffaa00", "#66ccff", "#cc66ff", "#ff88aa",
];

/// A live falling letter
///
/// Immutable after spawn except `fall_ms`, which slow-motion rewrites in
/// place for letters already in flight.
#[derive(Debug, Clone)]
pub struct FallingLetter {
    pub id: Uuid,
    /// Uppercase A-Z
    pub character: char,
    pub color: &'static str,
    /// Fall duration snapshot taken at spawn time
    pub fall_ms: u64,
}

impl FallingLetter {
    /// Create a letter with a uniformly random character and color
    pub fn random<R: Rng>(rng: &mut R, fall_ms: u64) -> Self {
        let bytes = ALPHABET.as_bytes();
        let character = bytes[rng.gen_range(0..bytes.len())] as char;
        let color = PALETTE[rng.gen_range(0..PALETTE.len())];
        Self {
            id: Uuid::new_v4(),
            character,
            color,
            fall_ms,
        }
    }
}

/// Power-up effect variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpKind {
    /// One extra life, capped at the maximum
    ExtraLife,
    /// Temporarily doubles fall durations
    SlowMotion,
    /// Destroys every live letter for a flat bonus
    ClearLetters,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::ExtraLife,
        PowerUpKind::SlowMotion,
        PowerUpKind::ClearLetters,
    ];

    /// Display glyph shown in score popups
    pub fn glyph(&self) -> &'static str {
        match self {
            PowerUpKind::ExtraLife => "\u{2764}\u{fe0f}",
            PowerUpKind::SlowMotion => "\u{23f1}\u{fe0f}",
            PowerUpKind::ClearLetters => "\u{1f4a3}",
        }
    }
}

/// A live collectible power-up
#[derive(Debug, Clone)]
pub struct ActivePowerUp {
    pub id: Uuid,
    pub kind: PowerUpKind,
    /// Power-ups fall slower than letters
    pub fall_ms: u64,
}

impl ActivePowerUp {
    pub fn new(kind: PowerUpKind, fall_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            fall_ms,
        }
    }

    /// Create a power-up of uniformly random kind
    pub fn random<R: Rng>(rng: &mut R, fall_ms: u64) -> Self {
        let kind = PowerUpKind::ALL[rng.gen_range(0..PowerUpKind::ALL.len())];
        Self::new(kind, fall_ms)
    }
}
