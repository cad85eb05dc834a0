//! Persistence and leaderboard data handling

use std::path::PathBuf;

use uuid::Uuid;

use letterfall::store::scores::{sanitize_player_name, ScoreRow};
use letterfall::HighScoreFile;

fn temp_path() -> PathBuf {
    std::env::temp_dir().join(format!("letterfall-store-test-{}.json", Uuid::new_v4()))
}

#[test]
fn high_score_round_trips_through_disk() {
    let path = temp_path();
    let file = HighScoreFile::new(path.clone());

    assert_eq!(file.load(), 0);

    file.save(4_321);
    assert_eq!(file.load(), 4_321);

    // A fresh handle sees the same value
    assert_eq!(HighScoreFile::new(path).load(), 4_321);
}

#[test]
fn corrupt_high_score_file_degrades_to_zero() {
    let path = temp_path();
    std::fs::write(&path, "definitely not json").unwrap();

    assert_eq!(HighScoreFile::new(path).load(), 0);
}

#[test]
fn player_names_are_trimmed_and_capped() {
    assert_eq!(sanitize_player_name("  ace  "), "ace");
    assert_eq!(sanitize_player_name(""), "");

    let long = "x".repeat(80);
    assert_eq!(sanitize_player_name(&long).chars().count(), 50);
}

#[test]
fn score_rows_parse_a_postgrest_payload() {
    let payload = r#"[
        {
            "player_name": "ACE",
            "score": 1200,
            "level": 5,
            "max_combo": 9,
            "created_at": "2026-01-15T18:04:05.123456+00:00"
        },
        {
            "player_name": "ZED",
            "score": 800,
            "level": 4,
            "max_combo": 6,
            "created_at": "2026-01-14T09:30:00+00:00"
        }
    ]"#;

    let rows: Vec<ScoreRow> = serde_json::from_str(payload).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].player_name, "ACE");
    assert_eq!(rows[0].score, 1_200);
    assert_eq!(rows[0].level, 5);
    assert_eq!(rows[0].max_combo, 9);
    assert!(rows[0].created_at > rows[1].created_at);
}
