//! Scenario tests driving the engine's mutation methods synchronously
//!
//! Scheduler ticks are invoked directly (spawn_letter / step_difficulty / …)
//! so every timing-dependent behavior is exercised deterministically.

use std::path::PathBuf;
use std::time::Duration;

use uuid::Uuid;

use letterfall::{
    Game, GameEvent, GameHandle, GamePhase, HighScoreFile, PowerUpKind, Services, Tuning,
};

fn temp_high_score_path() -> PathBuf {
    std::env::temp_dir().join(format!("letterfall-test-{}.json", Uuid::new_v4()))
}

fn new_game_at(path: PathBuf) -> (Game, GameHandle) {
    let services = Services {
        high_scores: HighScoreFile::new(path),
        scoreboard: None,
        player_name: "tester".to_string(),
    };
    Game::new(Tuning::default(), 0xC0FFEE, services)
}

fn new_game() -> (Game, GameHandle) {
    new_game_at(temp_high_score_path())
}

#[tokio::test]
async fn first_hit_scores_ten() {
    let (mut game, _handle) = new_game();
    game.start();
    game.spawn_letter();

    let letter = game.state().letters[0].clone();
    game.press_key(letter.character);

    assert_eq!(game.state().score, 10);
    assert_eq!(game.state().combo, 2);
    assert_eq!(game.state().max_combo, 2);
    assert!(game.state().letters.is_empty());
}

#[tokio::test]
async fn combo_multiplies_consecutive_hits() {
    let (mut game, _handle) = new_game();
    game.start();
    for _ in 0..3 {
        game.spawn_letter();
    }

    let mut expected = 0;
    for combo in 1..=3u64 {
        let character = game.state().letters[0].character;
        game.press_key(character);
        expected += 10 * combo;
        assert_eq!(game.state().score, expected);
    }

    assert_eq!(game.state().score, 60);
    assert_eq!(game.state().combo, 4);
    assert_eq!(game.state().max_combo, 4);
}

#[tokio::test]
async fn unmatched_press_is_not_a_miss() {
    let (mut game, _handle) = new_game();
    game.start();
    game.spawn_letter();

    let present = game.state().letters[0].character;
    let absent = ('A'..='Z').find(|c| *c != present).unwrap();
    game.press_key(absent);

    assert_eq!(game.state().score, 0);
    assert_eq!(game.state().combo, 1);
    assert_eq!(game.state().lives, 3);
    assert_eq!(game.state().letters.len(), 1);
}

#[tokio::test]
async fn presses_are_case_insensitive() {
    let (mut game, _handle) = new_game();
    game.start();
    game.spawn_letter();

    let character = game.state().letters[0].character;
    game.press_key(character.to_ascii_lowercase());

    assert_eq!(game.state().score, 10);
    assert!(game.state().letters.is_empty());
}

#[tokio::test]
async fn earliest_spawned_duplicate_wins() {
    let (mut game, _handle) = new_game();
    game.start();
    // 27 spawns over a 26-letter alphabet guarantee a repeat
    for _ in 0..27 {
        game.spawn_letter();
    }

    let letters = game.state().letters.clone();
    let mut dup = None;
    'outer: for i in 0..letters.len() {
        for j in (i + 1)..letters.len() {
            if letters[j].character == letters[i].character {
                dup = Some((i, j));
                break 'outer;
            }
        }
    }
    let (first, second) = dup.expect("27 spawns must repeat a character");
    let (first, second) = (letters[first].clone(), letters[second].clone());

    game.press_key(first.character);

    let state = game.state();
    assert!(state.letters.iter().all(|l| l.id != first.id));
    assert!(state.letters.iter().any(|l| l.id == second.id));
}

#[tokio::test]
async fn miss_resets_combo_and_costs_a_life() {
    let (mut game, _handle) = new_game();
    game.start();
    for _ in 0..3 {
        game.spawn_letter();
    }

    // Two hits bring the combo to 3
    for _ in 0..2 {
        let character = game.state().letters[0].character;
        game.press_key(character);
    }
    assert_eq!(game.state().combo, 3);

    let remaining = game.state().letters[0].clone();
    game.letter_expired(remaining.id);

    assert_eq!(game.state().combo, 1);
    assert_eq!(game.state().lives, 2);
    assert_eq!(game.state().max_combo, 3);
    assert!(game.state().letters.is_empty());
}

#[tokio::test]
async fn expiry_after_hit_is_ignored() {
    let (mut game, _handle) = new_game();
    game.start();
    game.spawn_letter();

    let letter = game.state().letters[0].clone();
    game.press_key(letter.character);

    // The renderer's expiry callback races the hit; the id is gone
    game.letter_expired(letter.id);

    assert_eq!(game.state().lives, 3);
    assert_eq!(game.state().combo, 2);
}

#[tokio::test]
async fn third_miss_ends_the_game() {
    let (mut game, _handle) = new_game();
    game.start();

    for _ in 0..3 {
        game.spawn_letter();
        let id = game.state().letters[0].id;
        game.letter_expired(id);
    }

    assert_eq!(game.state().phase, GamePhase::Over);
    assert_eq!(game.state().lives, 0);
    assert!(game.state().letters.is_empty());
    assert!(game.state().power_ups.is_empty());

    // Input and callbacks after game over are inert
    game.press_key('A');
    game.letter_expired(Uuid::new_v4());
    assert_eq!(game.state().phase, GamePhase::Over);
    assert_eq!(game.state().score, 0);
}

#[tokio::test]
async fn extra_life_caps_at_five() {
    let (mut game, _handle) = new_game();
    game.start();
    assert_eq!(game.state().lives, 3);

    for expected in [4u8, 5, 5] {
        game.spawn_power_up(PowerUpKind::ExtraLife);
        let id = game.state().power_ups[0].id;
        game.power_up_collected(id);
        assert_eq!(game.state().lives, expected);
    }
}

#[tokio::test]
async fn clear_letters_pays_flat_bonus_without_combo() {
    let (mut game, _handle) = new_game();
    game.start();
    for _ in 0..6 {
        game.spawn_letter();
    }

    // Two hits first, so a combo is live: 10 + 20 points
    for _ in 0..2 {
        let character = game.state().letters[0].character;
        game.press_key(character);
    }
    assert_eq!(game.state().score, 30);
    assert_eq!(game.state().combo, 3);
    assert_eq!(game.state().letters.len(), 4);

    game.spawn_power_up(PowerUpKind::ClearLetters);
    let id = game.state().power_ups[0].id;
    game.power_up_collected(id);

    assert!(game.state().letters.is_empty());
    assert_eq!(game.state().score, 30 + 4 * 5);
    assert_eq!(game.state().combo, 3);
    assert_eq!(game.state().max_combo, 3);
}

#[tokio::test]
async fn stale_power_up_collect_is_ignored() {
    let (mut game, _handle) = new_game();
    game.start();
    game.spawn_power_up(PowerUpKind::ExtraLife);

    let id = game.state().power_ups[0].id;
    game.power_up_expired(id);
    assert!(game.state().power_ups.is_empty());

    game.power_up_collected(id);
    assert_eq!(game.state().lives, 3);
}

#[tokio::test]
async fn slow_motion_doubles_then_restores() {
    let (mut game, _handle) = new_game();
    game.start();
    game.spawn_letter();
    game.spawn_letter();

    game.spawn_power_up(PowerUpKind::SlowMotion);
    let id = game.state().power_ups[0].id;
    game.power_up_collected(id);

    assert_eq!(game.state().fall_ms, 10_000);
    assert!(game.state().letters.iter().all(|l| l.fall_ms == 10_000));

    // Spawns during the window inherit the doubled duration
    game.spawn_letter();
    assert_eq!(game.state().letters.last().unwrap().fall_ms, 10_000);

    game.end_slow_motion();
    assert_eq!(game.state().fall_ms, 5_000);
    assert_eq!(game.state().slow_base_ms, None);
    // Letters already in flight keep their doubled duration
    assert!(game.state().letters.iter().all(|l| l.fall_ms == 10_000));
}

#[tokio::test]
async fn slow_motion_reentry_does_not_stack() {
    let (mut game, _handle) = new_game();
    game.start();

    for _ in 0..2 {
        game.spawn_power_up(PowerUpKind::SlowMotion);
        let id = game.state().power_ups[0].id;
        game.power_up_collected(id);
    }

    assert_eq!(game.state().fall_ms, 10_000);
    game.end_slow_motion();
    assert_eq!(game.state().fall_ms, 5_000);
}

#[tokio::test]
async fn difficulty_clamps_hold_under_many_levels() {
    let (mut game, _handle) = new_game();
    game.start();

    for _ in 0..100 {
        game.step_difficulty();
    }

    let state = game.state();
    assert_eq!(state.level, 101);
    assert_eq!(state.fall_ms, 1_500);
    assert_eq!(state.spawn_ms, 500);
    assert!((state.power_up_chance - 0.15).abs() < 1e-12);
}

#[tokio::test]
async fn difficulty_step_during_slow_motion_tightens_the_base() {
    let (mut game, _handle) = new_game();
    game.start();

    game.spawn_power_up(PowerUpKind::SlowMotion);
    let id = game.state().power_ups[0].id;
    game.power_up_collected(id);
    assert_eq!(game.state().fall_ms, 10_000);

    game.step_difficulty();
    assert_eq!(game.state().slow_base_ms, Some(4_800));
    assert_eq!(game.state().fall_ms, 9_600);

    game.end_slow_motion();
    assert_eq!(game.state().fall_ms, 4_800);
}

#[tokio::test]
async fn pause_freezes_and_resume_preserves_state() {
    let (mut game, _handle) = new_game();
    game.start();
    game.spawn_letter();
    game.spawn_letter();

    let character = game.state().letters[0].character;
    game.press_key(character);
    assert_eq!(game.state().score, 10);
    let survivor = game.state().letters[0].clone();

    game.pause();
    assert_eq!(game.state().phase, GamePhase::Paused);

    // Scheduler firings and input while paused are inert
    game.spawn_letter();
    game.press_key(survivor.character);
    game.letter_expired(survivor.id);
    assert_eq!(game.state().letters.len(), 1);
    assert_eq!(game.state().score, 10);
    assert_eq!(game.state().lives, 3);

    game.pause(); // already paused: no-op
    assert_eq!(game.state().phase, GamePhase::Paused);

    game.resume();
    assert_eq!(game.state().phase, GamePhase::Running);
    assert_eq!(game.state().score, 10);
    assert_eq!(game.state().level, 1);
    assert_eq!(game.state().lives, 3);
    assert_eq!(game.state().letters.len(), 1);

    game.resume(); // already running: no-op
    assert_eq!(game.state().phase, GamePhase::Running);
}

#[tokio::test]
async fn start_while_running_is_a_no_op() {
    let (mut game, _handle) = new_game();
    game.start();
    game.spawn_letter();
    let character = game.state().letters[0].character;
    game.press_key(character);

    game.start();
    assert_eq!(game.state().phase, GamePhase::Running);
    assert_eq!(game.state().score, 10);
}

#[tokio::test]
async fn restart_resets_the_run_but_keeps_the_high_score() {
    let path = temp_high_score_path();
    let (mut game, _handle) = new_game_at(path.clone());
    game.start();
    game.spawn_letter();
    let character = game.state().letters[0].character;
    game.press_key(character);

    for _ in 0..3 {
        game.spawn_letter();
        let id = game.state().letters[0].id;
        game.letter_expired(id);
    }
    assert_eq!(game.state().phase, GamePhase::Over);
    assert_eq!(game.state().high_score, 10);

    game.start();
    assert_eq!(game.state().phase, GamePhase::Running);
    assert_eq!(game.state().score, 0);
    assert_eq!(game.state().lives, 3);
    assert_eq!(game.state().combo, 1);
    assert_eq!(game.state().level, 1);
    assert_eq!(game.state().high_score, 10);
    assert!(game.state().letters.is_empty());

    // And it reached disk for the next session
    assert_eq!(HighScoreFile::new(path).load(), 10);
}

#[tokio::test]
async fn hit_event_carries_points_score_and_combo() {
    let (mut game, handle) = new_game();
    let mut events = handle.subscribe();

    game.start();
    game.spawn_letter();
    let character = game.state().letters[0].character;
    game.press_key(character);

    let mut saw_spawn = false;
    let mut saw_hit = false;
    while let Ok(event) = events.try_recv() {
        match event {
            GameEvent::LetterSpawned { .. } => saw_spawn = true,
            GameEvent::LetterHit {
                points,
                score,
                combo,
                ..
            } => {
                assert_eq!(points, 10);
                assert_eq!(score, 10);
                assert_eq!(combo, 2);
                saw_hit = true;
            }
            _ => {}
        }
    }
    assert!(saw_spawn);
    assert!(saw_hit);
}

#[test]
fn handle_drives_the_command_loop() {
    tokio_test::block_on(async {
        let (game, handle) = new_game();
        let mut events = handle.subscribe();
        let task = tokio::spawn(game.run());

        handle.start().await;
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("no event before timeout")
            .expect("event channel closed");
        assert!(matches!(event, GameEvent::Started { .. }));

        handle.shutdown().await;
        task.await.expect("game task panicked");
    });
}
