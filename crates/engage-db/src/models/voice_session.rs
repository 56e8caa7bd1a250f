//! Voice session database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for voice_sessions table
#[derive(Debug, Clone, FromRow)]
pub struct VoiceSessionModel {
    pub id: i64,
    pub user_id: i64,
    pub channel_id: i64,
    pub guild_id: i64,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
}
