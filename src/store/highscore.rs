//! Local best-score persistence

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct SavedHighScore {
    high_score: u64,
}

/// JSON-file backed high score
///
/// Load degrades to 0 on a missing or unreadable file; save never fails the
/// caller, it logs and moves on. The game must not stall on persistence.
#[derive(Debug, Clone)]
pub struct HighScoreFile {
    path: PathBuf,
}

impl HighScoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> u64 {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no saved high score");
                return 0;
            }
        };
        match serde_json::from_str::<SavedHighScore>(&raw) {
            Ok(saved) => saved.high_score,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "high score file corrupt, ignoring");
                0
            }
        }
    }

    pub fn save(&self, high_score: u64) {
        let payload = match serde_json::to_string(&SavedHighScore { high_score }) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "failed to encode high score");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, payload) {
            warn!(path = %self.path.display(), error = %e, "failed to persist high score");
        }
    }
}
