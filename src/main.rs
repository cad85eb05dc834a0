//! Letterfall - falling-letter reflex game
//!
//! This binary wires the engine to a headless frontend:
//! - stdin lines become input (letter presses, pause toggle, start/restart)
//! - the event stream is logged, with audio cues surfaced as debug lines
//! - fall completion is simulated by sleeping out each entity's fall
//!   duration and invoking the expiry callback, the way a real renderer
//!   reports "entity reached bottom"
//!
//! A graphical frontend would replace everything in this file and keep the
//! library untouched.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use letterfall::{
    Config, Game, GameEvent, GameHandle, HighScoreFile, ScoreboardStore, Services, SupabaseClient,
    Tuning,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Letterfall");

    let scoreboard = config.leaderboard.as_ref().map(|lb| {
        ScoreboardStore::new(SupabaseClient::new(&lb.supabase_url, &lb.supabase_anon_key))
    });
    if scoreboard.is_none() {
        info!("leaderboard disabled (SUPABASE_URL / SUPABASE_ANON_KEY not set)");
    }

    let services = Services {
        high_scores: HighScoreFile::new(&config.high_score_path),
        scoreboard,
        player_name: config.player_name.clone(),
    };

    let (game, handle) = Game::new(Tuning::default(), rand::random(), services);
    let game_task = tokio::spawn(game.run());

    // Frontend state: power-ups currently on screen, collectable via "grab"
    let live_power_ups = Arc::new(Mutex::new(Vec::new()));
    tokio::spawn(run_presenter(handle.clone(), live_power_ups.clone()));

    info!("commands: start | pause | grab | quit, or a single letter a-z");

    tokio::select! {
        result = run_input(handle.clone(), live_power_ups) => result?,
        _ = shutdown_signal() => {}
    }

    handle.shutdown().await;
    game_task.await.ok();

    info!("Letterfall shutdown complete");
    Ok(())
}

/// Consume the event stream: log it, surface audio cues, and simulate the
/// renderer's fall-completion callbacks
async fn run_presenter(handle: GameHandle, live_power_ups: Arc<Mutex<Vec<Uuid>>>) {
    let mut events = handle.subscribe();

    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(lagged_count = n, "Presenter lagged, skipping {} events", n);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        if let Some(sound) = event.sound() {
            debug!(sound = ?sound, "audio cue");
        }

        match event {
            GameEvent::LetterSpawned {
                id,
                character,
                fall_ms,
                ..
            } => {
                info!(%character, fall_ms, "letter falling");
                let handle = handle.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(fall_ms)).await;
                    handle.letter_expired(id).await;
                });
            }
            GameEvent::PowerUpSpawned { id, kind, fall_ms } => {
                info!(kind = ?kind, glyph = kind.glyph(), "power-up falling, grab to collect");
                live_power_ups.lock().await.push(id);
                let handle = handle.clone();
                let live = live_power_ups.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(fall_ms)).await;
                    handle.power_up_expired(id).await;
                    live.lock().await.retain(|p| *p != id);
                });
            }
            GameEvent::PowerUpCollected { id, kind, lives } => {
                live_power_ups.lock().await.retain(|p| *p != id);
                info!(kind = ?kind, lives, "power-up collected");
            }
            GameEvent::PowerUpExpired { id } => {
                live_power_ups.lock().await.retain(|p| *p != id);
            }
            GameEvent::LetterHit {
                character,
                points,
                score,
                combo,
                ..
            } => {
                info!(%character, points, score, combo, "hit");
            }
            GameEvent::LetterMissed {
                character, lives, ..
            } => {
                info!(%character, lives, "miss");
            }
            GameEvent::ClearBonus {
                destroyed,
                bonus,
                score,
            } => {
                info!(destroyed, bonus, score, "letters cleared");
            }
            GameEvent::LevelUp {
                level,
                fall_ms,
                spawn_ms,
                ..
            } => {
                info!(level, fall_ms, spawn_ms, "level up");
            }
            GameEvent::GameOver {
                score,
                level,
                max_combo,
                high_score,
                new_record,
            } => {
                live_power_ups.lock().await.clear();
                info!(
                    score,
                    level, max_combo, high_score, new_record, "game over, start to play again"
                );
            }
            other => debug!(event = ?other, "event"),
        }
    }
}

/// Map stdin lines onto game input
async fn run_input(
    handle: GameHandle,
    live_power_ups: Arc<Mutex<Vec<Uuid>>>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => continue,
            "quit" | "exit" => break,
            "start" => handle.start().await,
            "pause" => handle.toggle_pause().await,
            "grab" => {
                let id = live_power_ups.lock().await.first().copied();
                match id {
                    Some(id) => handle.power_up_collected(id).await,
                    None => info!("no power-up on screen"),
                }
            }
            _ => {
                let mut chars = input.chars();
                match (chars.next(), chars.next()) {
                    (Some(key), None) if key.is_ascii_alphabetic() => {
                        handle.press_key(key).await;
                    }
                    _ => info!(input, "unrecognized command"),
                }
            }
        }
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
