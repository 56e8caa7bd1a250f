//! Stats database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for user_stats table
#[derive(Debug, Clone, FromRow)]
pub struct UserStatsModel {
    pub user_id: i64,
    pub message_count: i64,
    pub reaction_count: i64,
    pub voice_minutes: i64,
    pub last_active: DateTime<Utc>,
}

/// One row of an all-time ranking query
#[derive(Debug, Clone, FromRow)]
pub struct LeaderboardRowModel {
    pub user_id: i64,
    pub score: i64,
}
