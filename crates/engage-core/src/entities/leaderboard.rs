//! Ranked leaderboard row

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// One row of a ranked top-K result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: Snowflake,
    pub score: i64,
}

impl LeaderboardEntry {
    pub fn new(user_id: Snowflake, score: i64) -> Self {
        Self { user_id, score }
    }

    /// Sort rows by score descending, then user id ascending
    pub fn rank(entries: &mut [LeaderboardEntry]) {
        entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.user_id.cmp(&b.user_id)));
    }
}
