//! Game state machine and authoritative command loop
//!
//! A `Game` exclusively owns the mutable state. It is driven either through
//! the async `run()` loop (commands queued via `GameHandle`) or by calling
//! the mutation methods directly when embedding the engine. Handlers run to
//! completion in delivery order; the only suspension points are the
//! scheduler timers.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::store::highscore::HighScoreFile;
use crate::store::scores::ScoreboardStore;

use super::entities::{ActivePowerUp, FallingLetter, PowerUpKind};
use super::events::GameEvent;
use super::state::{GamePhase, GameState, Tuning};
use super::timer::TimerTask;

/// Commands consumed by the game loop
///
/// Scheduler ticks carry the epoch current when their timer was armed; the
/// loop drops ticks whose epoch is stale, so a firing already queued when its
/// timer was cancelled can never reach a newer state.
#[derive(Debug, Clone)]
pub(crate) enum Command {
    Start,
    Pause,
    Resume,
    TogglePause,
    Key(char),
    LetterExpired(Uuid),
    PowerUpCollected(Uuid),
    PowerUpExpired(Uuid),
    LetterTick { epoch: u64 },
    PowerUpTick { epoch: u64 },
    DifficultyTick { epoch: u64 },
    SlowMotionTick { epoch: u64 },
    Shutdown,
}

/// External collaborators the engine calls at game end
pub struct Services {
    /// Local best-score persistence
    pub high_scores: HighScoreFile,
    /// Online leaderboard; `None` disables submission entirely
    pub scoreboard: Option<ScoreboardStore>,
    /// Name submitted with leaderboard scores
    pub player_name: String,
}

/// Scheduler slots owned by the game loop
///
/// `None` means cancelled; assigning a slot aborts the previous task.
#[derive(Default)]
struct Schedulers {
    letter_spawn: Option<TimerTask>,
    power_up_roll: Option<TimerTask>,
    difficulty: Option<TimerTask>,
    slow_motion: Option<TimerTask>,
}

/// Handle to a running game
#[derive(Clone)]
pub struct GameHandle {
    cmd_tx: mpsc::Sender<Command>,
    events: broadcast::Sender<GameEvent>,
}

impl GameHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    pub async fn start(&self) {
        self.send(Command::Start).await;
    }

    pub async fn pause(&self) {
        self.send(Command::Pause).await;
    }

    pub async fn resume(&self) {
        self.send(Command::Resume).await;
    }

    /// Pause key and visibility-loss both route here
    pub async fn toggle_pause(&self) {
        self.send(Command::TogglePause).await;
    }

    pub async fn press_key(&self, key: char) {
        self.send(Command::Key(key)).await;
    }

    /// Renderer callback: a letter's fall completed without being hit
    pub async fn letter_expired(&self, id: Uuid) {
        self.send(Command::LetterExpired(id)).await;
    }

    pub async fn power_up_collected(&self, id: Uuid) {
        self.send(Command::PowerUpCollected(id)).await;
    }

    pub async fn power_up_expired(&self, id: Uuid) {
        self.send(Command::PowerUpExpired(id)).await;
    }

    pub async fn shutdown(&self) {
        self.send(Command::Shutdown).await;
    }

    async fn send(&self, cmd: Command) {
        if self.cmd_tx.send(cmd).await.is_err() {
            debug!("game loop gone, command dropped");
        }
    }
}

/// The authoritative game
pub struct Game {
    state: GameState,
    tuning: Tuning,
    rng: ChaCha8Rng,
    cmd_tx: mpsc::Sender<Command>,
    cmd_rx: mpsc::Receiver<Command>,
    events: broadcast::Sender<GameEvent>,
    timers: Schedulers,
    /// Bumped on every start/pause/resume/end; invalidates queued ticks
    epoch: u64,
    services: Services,
}

impl Game {
    /// Create a game and its handle
    pub fn new(tuning: Tuning, seed: u64, services: Services) -> (Self, GameHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(256);
        let (events, _) = broadcast::channel(64);

        let mut state = GameState::new(&tuning);
        state.high_score = services.high_scores.load();

        let handle = GameHandle {
            cmd_tx: cmd_tx.clone(),
            events: events.clone(),
        };

        let game = Self {
            state,
            tuning,
            rng: ChaCha8Rng::seed_from_u64(seed),
            cmd_tx,
            cmd_rx,
            events,
            timers: Schedulers::default(),
            epoch: 0,
            services,
        };

        (game, handle)
    }

    /// Read access for embedders and tests
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Run the command loop until shutdown or all handles are dropped
    pub async fn run(mut self) {
        info!("game loop started");

        while let Some(cmd) = self.cmd_rx.recv().await {
            match cmd {
                Command::Start => self.start(),
                Command::Pause => self.pause(),
                Command::Resume => self.resume(),
                Command::TogglePause => self.toggle_pause(),
                Command::Key(key) => self.press_key(key),
                Command::LetterExpired(id) => self.letter_expired(id),
                Command::PowerUpCollected(id) => self.power_up_collected(id),
                Command::PowerUpExpired(id) => self.power_up_expired(id),
                Command::LetterTick { epoch } if epoch == self.epoch => self.spawn_letter(),
                Command::PowerUpTick { epoch } if epoch == self.epoch => self.roll_power_up(),
                Command::DifficultyTick { epoch } if epoch == self.epoch => self.step_difficulty(),
                Command::SlowMotionTick { epoch } if epoch == self.epoch => self.end_slow_motion(),
                Command::LetterTick { .. }
                | Command::PowerUpTick { .. }
                | Command::DifficultyTick { .. }
                | Command::SlowMotionTick { .. } => {
                    debug!("stale scheduler tick dropped");
                }
                Command::Shutdown => break,
            }
        }

        self.cancel_schedulers();
        info!("game loop stopped");
    }

    // ------------------------------------------------------------------
    // State machine
    // ------------------------------------------------------------------

    /// Begin a fresh run; valid from Idle or Over, otherwise a no-op
    pub fn start(&mut self) {
        match self.state.phase {
            GamePhase::Idle | GamePhase::Over => {}
            GamePhase::Running | GamePhase::Paused => return,
        }

        self.epoch += 1;
        self.state.reset_for_run(&self.tuning);
        self.state.phase = GamePhase::Running;

        let _ = self.events.send(GameEvent::Started {
            high_score: self.state.high_score,
        });
        self.arm_schedulers();

        info!(high_score = self.state.high_score, "game started");
    }

    /// Freeze the run; valid only while Running
    pub fn pause(&mut self) {
        if self.state.phase != GamePhase::Running {
            return;
        }

        self.epoch += 1;
        self.cancel_schedulers();
        self.state.phase = GamePhase::Paused;

        let _ = self.events.send(GameEvent::Paused);
        info!(score = self.state.score, "game paused");
    }

    /// Continue a paused run with current difficulty parameters
    pub fn resume(&mut self) {
        if self.state.phase != GamePhase::Paused {
            return;
        }

        self.epoch += 1;
        self.state.phase = GamePhase::Running;
        self.arm_schedulers();

        let _ = self.events.send(GameEvent::Resumed);
        info!(score = self.state.score, "game resumed");
    }

    pub fn toggle_pause(&mut self) {
        match self.state.phase {
            GamePhase::Running => self.pause(),
            GamePhase::Paused => self.resume(),
            GamePhase::Idle | GamePhase::Over => {}
        }
    }

    /// Finish the run: cancel timers, settle the high score, notify the
    /// leaderboard without awaiting it
    fn end(&mut self) {
        self.epoch += 1;
        self.cancel_schedulers();
        self.state.phase = GamePhase::Over;

        // Remaining entities are destroyed without scoring
        self.state.letters.clear();
        self.state.power_ups.clear();
        self.state.slow_base_ms = None;

        let new_record = self.state.score > self.state.high_score;
        if new_record {
            self.state.high_score = self.state.score;
            self.services.high_scores.save(self.state.high_score);
        }

        let _ = self.events.send(GameEvent::GameOver {
            score: self.state.score,
            level: self.state.level,
            max_combo: self.state.max_combo,
            high_score: self.state.high_score,
            new_record,
        });

        info!(
            score = self.state.score,
            level = self.state.level,
            max_combo = self.state.max_combo,
            new_record,
            "game over"
        );

        if let Some(scoreboard) = self.services.scoreboard.clone() {
            let name = self.services.player_name.clone();
            let (score, level, max_combo) =
                (self.state.score, self.state.level, self.state.max_combo);
            tokio::spawn(async move {
                if scoreboard.is_top_score(score).await {
                    info!(score, "score qualifies for the global top 10");
                }
                if scoreboard.submit_score(&name, score, level, max_combo).await {
                    info!(score, "score submitted to leaderboard");
                } else {
                    warn!(score, "leaderboard submission failed");
                }
            });
        }
    }

    // ------------------------------------------------------------------
    // Schedulers
    // ------------------------------------------------------------------

    fn arm_schedulers(&mut self) {
        let spawn_period = Duration::from_millis(self.state.spawn_ms);
        // First letter drops immediately; the rest follow the spawn interval
        self.timers.letter_spawn = Some(TimerTask::repeating(
            Duration::ZERO,
            spawn_period,
            self.cmd_tx.clone(),
            Command::LetterTick { epoch: self.epoch },
        ));
        self.timers.power_up_roll = Some(TimerTask::repeating(
            self.tuning.power_up_roll_period,
            self.tuning.power_up_roll_period,
            self.cmd_tx.clone(),
            Command::PowerUpTick { epoch: self.epoch },
        ));
        self.timers.difficulty = Some(TimerTask::repeating(
            self.tuning.difficulty_period,
            self.tuning.difficulty_period,
            self.cmd_tx.clone(),
            Command::DifficultyTick { epoch: self.epoch },
        ));
        // A slow-motion window interrupted by pause restarts in full
        if self.state.slow_base_ms.is_some() {
            self.timers.slow_motion = Some(TimerTask::once(
                self.tuning.slow_motion_window,
                self.cmd_tx.clone(),
                Command::SlowMotionTick { epoch: self.epoch },
            ));
        }
    }

    fn cancel_schedulers(&mut self) {
        self.timers.letter_spawn = None;
        self.timers.power_up_roll = None;
        self.timers.difficulty = None;
        self.timers.slow_motion = None;
    }

    /// Spawn one falling letter at the current speed
    pub fn spawn_letter(&mut self) {
        if self.state.phase != GamePhase::Running {
            return;
        }

        let letter = FallingLetter::random(&mut self.rng, self.state.fall_ms);
        let _ = self.events.send(GameEvent::LetterSpawned {
            id: letter.id,
            character: letter.character,
            color: letter.color,
            fall_ms: letter.fall_ms,
        });
        debug!(character = %letter.character, fall_ms = letter.fall_ms, "letter spawned");
        self.state.letters.push(letter);
    }

    /// Roll the power-up chance; on success spawn one of random kind
    pub fn roll_power_up(&mut self) {
        if self.state.phase != GamePhase::Running {
            return;
        }
        if self.rng.gen::<f64>() >= self.state.power_up_chance {
            return;
        }

        // Power-ups drift down at 1.5x the letter fall duration
        let fall_ms = self.state.fall_ms * 3 / 2;
        let power_up = ActivePowerUp::random(&mut self.rng, fall_ms);
        self.spawn_power_up_of(power_up);
    }

    /// Spawn a power-up of a specific kind at the current speed
    pub fn spawn_power_up(&mut self, kind: PowerUpKind) {
        if self.state.phase != GamePhase::Running {
            return;
        }
        let fall_ms = self.state.fall_ms * 3 / 2;
        self.spawn_power_up_of(ActivePowerUp::new(kind, fall_ms));
    }

    fn spawn_power_up_of(&mut self, power_up: ActivePowerUp) {
        let _ = self.events.send(GameEvent::PowerUpSpawned {
            id: power_up.id,
            kind: power_up.kind,
            fall_ms: power_up.fall_ms,
        });
        debug!(kind = ?power_up.kind, "power-up spawned");
        self.state.power_ups.push(power_up);
    }

    /// Advance one difficulty level and re-arm the spawn scheduler so the
    /// tightened interval takes effect without waiting out the old period
    pub fn step_difficulty(&mut self) {
        if self.state.phase != GamePhase::Running {
            return;
        }

        self.state.tighten_difficulty(&self.tuning);

        let period = Duration::from_millis(self.state.spawn_ms);
        self.timers.letter_spawn = Some(TimerTask::repeating(
            period,
            period,
            self.cmd_tx.clone(),
            Command::LetterTick { epoch: self.epoch },
        ));

        let _ = self.events.send(GameEvent::LevelUp {
            level: self.state.level,
            fall_ms: self.state.fall_ms,
            spawn_ms: self.state.spawn_ms,
            power_up_chance: self.state.power_up_chance,
        });

        info!(
            level = self.state.level,
            fall_ms = self.state.fall_ms,
            spawn_ms = self.state.spawn_ms,
            "level up"
        );
    }

    // ------------------------------------------------------------------
    // Hit resolution
    // ------------------------------------------------------------------

    /// Resolve a pressed letter key
    ///
    /// The earliest-spawned matching letter is hit; a press with no live
    /// match never affects score, combo, or lives.
    pub fn press_key(&mut self, key: char) {
        if self.state.phase != GamePhase::Running {
            return;
        }
        if !key.is_ascii_alphabetic() {
            return;
        }
        let key = key.to_ascii_uppercase();

        let Some(letter) = self.state.take_letter_matching(key) else {
            return;
        };

        let points = self.state.apply_hit(&self.tuning);
        let _ = self.events.send(GameEvent::LetterHit {
            id: letter.id,
            character: letter.character,
            color: letter.color,
            points,
            score: self.state.score,
            combo: self.state.combo,
        });
        debug!(
            character = %letter.character,
            points,
            combo = self.state.combo,
            "letter hit"
        );
    }

    /// Renderer callback: a letter reached the bottom unhandled
    ///
    /// The presence check resolves the race against a hit that landed while
    /// the notification was in flight.
    pub fn letter_expired(&mut self, id: Uuid) {
        if self.state.phase != GamePhase::Running {
            return;
        }
        let Some(letter) = self.state.take_letter(id) else {
            return;
        };

        self.state.apply_miss();
        let _ = self.events.send(GameEvent::LetterMissed {
            id: letter.id,
            character: letter.character,
            lives: self.state.lives,
        });
        debug!(character = %letter.character, lives = self.state.lives, "letter missed");

        if self.state.lives == 0 {
            self.end();
        }
    }

    // ------------------------------------------------------------------
    // Power-up effects
    // ------------------------------------------------------------------

    /// Apply a collected power-up; a stale id is a benign no-op
    pub fn power_up_collected(&mut self, id: Uuid) {
        if self.state.phase != GamePhase::Running {
            return;
        }
        let Some(power_up) = self.state.take_power_up(id) else {
            return;
        };

        match power_up.kind {
            PowerUpKind::ExtraLife => {
                self.state.lives = (self.state.lives + 1).min(self.tuning.max_lives);
            }
            PowerUpKind::SlowMotion => self.slow_motion(),
            PowerUpKind::ClearLetters => self.clear_letters(),
        }

        let _ = self.events.send(GameEvent::PowerUpCollected {
            id: power_up.id,
            kind: power_up.kind,
            lives: self.state.lives,
        });
        info!(kind = ?power_up.kind, lives = self.state.lives, "power-up collected");
    }

    /// Uncollected power-up left the play area; no penalty
    pub fn power_up_expired(&mut self, id: Uuid) {
        if self.state.phase != GamePhase::Running {
            return;
        }
        if self.state.take_power_up(id).is_some() {
            let _ = self.events.send(GameEvent::PowerUpExpired { id });
        }
    }

    /// Double fall durations for live letters and subsequent spawns, for one
    /// restore window
    ///
    /// Re-entrant collection is last-write-wins: the doubled value is always
    /// computed from the pre-effect base and the window restarts.
    fn slow_motion(&mut self) {
        let base = self.state.slow_base_ms.take().unwrap_or(self.state.fall_ms);
        let doubled = base.saturating_mul(2);
        self.state.fall_ms = doubled;
        self.state.slow_base_ms = Some(base);

        for letter in &mut self.state.letters {
            letter.fall_ms = doubled;
            let _ = self.events.send(GameEvent::LetterRetimed {
                id: letter.id,
                fall_ms: letter.fall_ms,
            });
        }

        self.timers.slow_motion = Some(TimerTask::once(
            self.tuning.slow_motion_window,
            self.cmd_tx.clone(),
            Command::SlowMotionTick { epoch: self.epoch },
        ));
    }

    /// Restore the pre-slow-motion fall duration for subsequent spawns;
    /// letters already in flight keep their doubled duration
    pub fn end_slow_motion(&mut self) {
        self.timers.slow_motion = None;
        if let Some(base) = self.state.slow_base_ms.take() {
            self.state.fall_ms = base;
            let _ = self.events.send(GameEvent::SlowMotionEnded { fall_ms: base });
            debug!(fall_ms = base, "slow motion ended");
        }
    }

    /// Destroy every live letter for a flat bonus; combo is untouched
    fn clear_letters(&mut self) {
        let cleared = self.state.drain_letters();
        let bonus = self.tuning.clear_bonus_per_letter * cleared.len() as u64;
        self.state.score += bonus;

        for letter in &cleared {
            let _ = self.events.send(GameEvent::LetterCleared {
                id: letter.id,
                character: letter.character,
                color: letter.color,
            });
        }
        let _ = self.events.send(GameEvent::ClearBonus {
            destroyed: cleared.len(),
            bonus,
            score: self.state.score,
        });
        debug!(destroyed = cleared.len(), bonus, "letters cleared");
    }
}
