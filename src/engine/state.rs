//! Authoritative game state and scoring arithmetic

use std::time::Duration;

use uuid::Uuid;

use super::entities::{ActivePowerUp, FallingLetter};

/// Game lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Before the first start
    Idle,
    /// Schedulers armed, input live
    Running,
    /// Schedulers cancelled, state frozen
    Paused,
    /// Game over, restartable
    Over,
}

/// Numeric tuning for a run
///
/// Difficulty tightens toward the floors/ceiling each level; the clamps are
/// hard regardless of how many levels elapse.
#[derive(Debug, Clone)]
pub struct Tuning {
    pub starting_lives: u8,
    pub max_lives: u8,
    /// Per-hit base points, multiplied by the current combo
    pub points_per_hit: u64,
    /// Flat bonus per letter destroyed by ClearLetters
    pub clear_bonus_per_letter: u64,
    pub initial_fall_ms: u64,
    pub min_fall_ms: u64,
    pub fall_step_ms: u64,
    pub initial_spawn_ms: u64,
    pub min_spawn_ms: u64,
    pub spawn_step_ms: u64,
    pub initial_power_up_chance: f64,
    pub max_power_up_chance: f64,
    pub power_up_chance_step: f64,
    /// Period between difficulty steps
    pub difficulty_period: Duration,
    /// Period between power-up spawn rolls
    pub power_up_roll_period: Duration,
    /// How long a SlowMotion effect lasts
    pub slow_motion_window: Duration,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            starting_lives: 3,
            max_lives: 5,
            points_per_hit: 10,
            clear_bonus_per_letter: 5,
            initial_fall_ms: 5000,
            min_fall_ms: 1500,
            fall_step_ms: 200,
            initial_spawn_ms: 1500,
            min_spawn_ms: 500,
            spawn_step_ms: 100,
            initial_power_up_chance: 0.05,
            max_power_up_chance: 0.15,
            power_up_chance_step: 0.01,
            difficulty_period: Duration::from_millis(15_000),
            power_up_roll_period: Duration::from_millis(3_000),
            slow_motion_window: Duration::from_millis(5_000),
        }
    }
}

/// The single mutable aggregate, owned exclusively by the game loop
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: GamePhase,
    pub score: u64,
    pub lives: u8,
    /// Consecutive-hit streak, never below 1
    pub combo: u32,
    pub max_combo: u32,
    pub level: u32,
    /// Best score across runs, persisted externally
    pub high_score: u64,
    /// Fall duration applied to newly spawned letters
    pub fall_ms: u64,
    pub spawn_ms: u64,
    pub power_up_chance: f64,
    /// Pre-slow-motion fall duration while the effect window is active
    pub slow_base_ms: Option<u64>,
    /// Live letters in spawn order
    pub letters: Vec<FallingLetter>,
    /// Live power-ups in spawn order
    pub power_ups: Vec<ActivePowerUp>,
}

impl GameState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            phase: GamePhase::Idle,
            score: 0,
            lives: tuning.starting_lives,
            combo: 1,
            max_combo: 1,
            level: 1,
            high_score: 0,
            fall_ms: tuning.initial_fall_ms,
            spawn_ms: tuning.initial_spawn_ms,
            power_up_chance: tuning.initial_power_up_chance,
            slow_base_ms: None,
            letters: Vec::new(),
            power_ups: Vec::new(),
        }
    }

    /// Reset everything except the persisted high score for a fresh run
    pub fn reset_for_run(&mut self, tuning: &Tuning) {
        let high_score = self.high_score;
        *self = Self::new(tuning);
        self.high_score = high_score;
    }

    /// Earliest-spawned letter matching `key`, removed from the registry
    ///
    /// Insertion order decides ties between same-character letters, not
    /// proximity to the bottom.
    pub fn take_letter_matching(&mut self, key: char) -> Option<FallingLetter> {
        let index = self.letters.iter().position(|l| l.character == key)?;
        Some(self.letters.remove(index))
    }

    /// Remove a letter by id if still live
    pub fn take_letter(&mut self, id: Uuid) -> Option<FallingLetter> {
        let index = self.letters.iter().position(|l| l.id == id)?;
        Some(self.letters.remove(index))
    }

    /// Remove a power-up by id if still live
    pub fn take_power_up(&mut self, id: Uuid) -> Option<ActivePowerUp> {
        let index = self.power_ups.iter().position(|p| p.id == id)?;
        Some(self.power_ups.remove(index))
    }

    /// Remove every live letter (ClearLetters, game over)
    pub fn drain_letters(&mut self) -> Vec<FallingLetter> {
        std::mem::take(&mut self.letters)
    }

    /// Score a hit: returns the points awarded at the pre-hit combo
    pub fn apply_hit(&mut self, tuning: &Tuning) -> u64 {
        let points = tuning.points_per_hit * u64::from(self.combo);
        self.score += points;
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        points
    }

    /// Penalize a miss: one life down, combo back to 1
    pub fn apply_miss(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.combo = 1;
    }

    /// Advance one difficulty level, clamping at the floors/ceiling
    ///
    /// While a slow-motion window is active the tightening applies to the
    /// saved base duration and the doubled value is recomputed from it, so
    /// the restore does not discard the step.
    pub fn tighten_difficulty(&mut self, tuning: &Tuning) {
        self.level += 1;
        match self.slow_base_ms {
            Some(base) => {
                let base = base.saturating_sub(tuning.fall_step_ms).max(tuning.min_fall_ms);
                self.slow_base_ms = Some(base);
                self.fall_ms = base * 2;
            }
            None => {
                self.fall_ms = self
                    .fall_ms
                    .saturating_sub(tuning.fall_step_ms)
                    .max(tuning.min_fall_ms);
            }
        }
        self.spawn_ms = self
            .spawn_ms
            .saturating_sub(tuning.spawn_step_ms)
            .max(tuning.min_spawn_ms);
        self.power_up_chance =
            (self.power_up_chance + tuning.power_up_chance_step).min(tuning.max_power_up_chance);
    }
}
