//! Global leaderboard over the Supabase `scores` table
//!
//! Every operation tolerates network failure by degrading to an empty or
//! negative result; nothing here ever throws into the game loop.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::supabase::SupabaseClient;

/// Leaderboard size and the name length the table accepts
const TOP_N: usize = 10;
const MAX_NAME_CHARS: usize = 50;

/// A leaderboard row
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRow {
    pub player_name: String,
    pub score: u64,
    pub level: u32,
    pub max_combo: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// New score for insertion
#[derive(Debug, Clone, Serialize)]
struct NewScore {
    player_name: String,
    score: u64,
    level: u32,
    max_combo: u32,
}

/// Trim and cap a submitted player name
pub fn sanitize_player_name(name: &str) -> String {
    name.trim().chars().take(MAX_NAME_CHARS).collect()
}

/// Leaderboard operations
#[derive(Clone)]
pub struct ScoreboardStore {
    client: SupabaseClient,
}

impl ScoreboardStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Top scores, descending; empty on any failure
    pub async fn top_scores(&self) -> Vec<ScoreRow> {
        let query = format!(
            "select=player_name,score,level,max_combo,created_at&order=score.desc&limit={}",
            TOP_N
        );
        match self.client.get("scores", &query).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "failed to fetch leaderboard");
                Vec::new()
            }
        }
    }

    /// Submit a finished run; returns whether the insert succeeded
    pub async fn submit_score(&self, name: &str, score: u64, level: u32, max_combo: u32) -> bool {
        let row = NewScore {
            player_name: sanitize_player_name(name),
            score,
            level,
            max_combo,
        };
        match self.client.insert("scores", &row).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to submit score");
                false
            }
        }
    }

    /// Whether `score` would enter the top 10
    pub async fn is_top_score(&self, score: u64) -> bool {
        let top = self.top_scores().await;
        if top.len() < TOP_N {
            return true;
        }
        match top.last() {
            Some(lowest) => score > lowest.score,
            None => true,
        }
    }
}
