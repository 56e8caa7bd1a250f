//! Role rule and assignment database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for role_rules table
#[derive(Debug, Clone, FromRow)]
pub struct RoleRuleModel {
    pub id: i64,
    pub guild_id: i64,
    pub name: String,
    pub min_messages: Option<i64>,
    pub min_reactions: Option<i64>,
    pub min_voice_minutes: Option<i64>,
    pub role_id: i64,
    pub enabled: bool,
}

/// Database model for user_role_assignments table
#[derive(Debug, Clone, FromRow)]
pub struct RoleAssignmentModel {
    pub user_id: i64,
    pub role_id: i64,
    pub guild_id: i64,
    pub reason: String,
    pub assigned_at: DateTime<Utc>,
}
