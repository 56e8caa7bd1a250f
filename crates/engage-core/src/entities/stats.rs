//! Durable engagement counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{Snowflake, StatCounter};

/// Per-user engagement counters (the counters of record)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: Snowflake,
    pub message_count: i64,
    pub reaction_count: i64,
    pub voice_minutes: i64,
    pub last_active: DateTime<Utc>,
}

impl UserStats {
    /// Fresh, all-zero stats for a user seen for the first time
    pub fn empty(user_id: Snowflake, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            message_count: 0,
            reaction_count: 0,
            voice_minutes: 0,
            last_active: now,
        }
    }

    #[inline]
    pub fn get(&self, counter: StatCounter) -> i64 {
        match counter {
            StatCounter::Messages => self.message_count,
            StatCounter::Reactions => self.reaction_count,
            StatCounter::VoiceMinutes => self.voice_minutes,
        }
    }

    /// Apply an increment in place. Stores use this to mirror the
    /// `count = count + amount` they perform atomically.
    pub fn apply(&mut self, counter: StatCounter, amount: i64, at: DateTime<Utc>) {
        let slot = match counter {
            StatCounter::Messages => &mut self.message_count,
            StatCounter::Reactions => &mut self.reaction_count,
            StatCounter::VoiceMinutes => &mut self.voice_minutes,
        };
        *slot = slot.saturating_add(amount.max(0));
        if at > self.last_active {
            self.last_active = at;
        }
    }
}

/// A user observed in a guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildMembership {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub first_seen: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}
