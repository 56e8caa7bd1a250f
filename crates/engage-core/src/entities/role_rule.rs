//! Role rules and the automated role assignments they produce

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::UserStats;
use crate::value_objects::Snowflake;

/// Threshold rule granting `role_id` to users whose stats meet every set minimum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRule {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub name: String,
    pub min_messages: Option<i64>,
    pub min_reactions: Option<i64>,
    pub min_voice_minutes: Option<i64>,
    pub role_id: Snowflake,
    pub enabled: bool,
}

impl RoleRule {
    /// Check eligibility. Unset thresholds are ignored, so a rule with no
    /// thresholds at all is satisfied by everyone.
    pub fn is_satisfied_by(&self, stats: &UserStats) -> bool {
        let meets = |min: Option<i64>, actual: i64| min.is_none_or(|m| actual >= m);
        meets(self.min_messages, stats.message_count)
            && meets(self.min_reactions, stats.reaction_count)
            && meets(self.min_voice_minutes, stats.voice_minutes)
    }

    /// Audit reason stored on assignments granted by this rule
    pub fn grant_reason(&self) -> String {
        format!("Automatically granted by rule: {}", self.name)
    }
}

/// Role held by a user because of automation. Unique per (user, role, guild).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub user_id: Snowflake,
    pub role_id: Snowflake,
    pub guild_id: Snowflake,
    pub reason: String,
    pub assigned_at: DateTime<Utc>,
}

/// Result of a grant attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// This call created the assignment
    Granted,
    /// The assignment already existed (possibly created by a racing call)
    AlreadyGranted,
}

impl GrantOutcome {
    #[inline]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Granted)
    }
}
