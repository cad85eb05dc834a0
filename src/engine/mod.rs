//! Real-time game core: entity lifecycle, schedulers, scoring, state machine

pub mod entities;
pub mod events;
pub mod game;
pub mod state;
mod timer;

pub use entities::{ActivePowerUp, FallingLetter, PowerUpKind};
pub use events::{GameEvent, SoundKind};
pub use game::{Game, GameHandle, Services};
pub use state::{GamePhase, GameState, Tuning};
