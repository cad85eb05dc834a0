//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;

/// Leaderboard credentials; absent entirely when unset
#[derive(Clone, Debug)]
pub struct LeaderboardConfig {
    /// Supabase project URL
    pub supabase_url: String,
    /// Supabase anonymous key (the only key the game ever holds)
    pub supabase_anon_key: String,
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Name submitted with leaderboard scores
    pub player_name: String,
    /// Where the local best score lives
    pub high_score_path: PathBuf,
    /// Online leaderboard; `None` means local play only
    pub leaderboard: Option<LeaderboardConfig>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// The leaderboard is optional: local play must survive a missing or
    /// unreachable backend, so only a half-configured pair is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let leaderboard = match (env::var("SUPABASE_URL"), env::var("SUPABASE_ANON_KEY")) {
            (Ok(supabase_url), Ok(supabase_anon_key)) => Some(LeaderboardConfig {
                supabase_url,
                supabase_anon_key,
            }),
            (Err(_), Err(_)) => None,
            _ => return Err(ConfigError::PartialLeaderboard),
        };

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            player_name: env::var("PLAYER_NAME").unwrap_or_else(|_| "anonymous".to_string()),
            high_score_path: env::var("HIGH_SCORE_PATH")
                .unwrap_or_else(|_| "letterfall_highscore.json".to_string())
                .into(),
            leaderboard,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SUPABASE_URL and SUPABASE_ANON_KEY must be set together")]
    PartialLeaderboard,
}
