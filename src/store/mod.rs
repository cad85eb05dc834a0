//! Persistence: local high score and the Supabase leaderboard

pub mod highscore;
pub mod scores;
pub mod supabase;

pub use highscore::HighScoreFile;
pub use scores::ScoreboardStore;
pub use supabase::SupabaseClient;
