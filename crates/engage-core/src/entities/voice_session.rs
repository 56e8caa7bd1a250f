//! Voice session entity - one stay of a user in a voice channel

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Voice session. Open while `left_at` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSession {
    /// Locally generated; increases with arrival order
    pub id: Snowflake,
    pub user_id: Snowflake,
    pub channel_id: Snowflake,
    pub guild_id: Snowflake,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
}

impl VoiceSession {
    pub fn open(
        id: Snowflake,
        user_id: Snowflake,
        channel_id: Snowflake,
        guild_id: Snowflake,
        joined_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            channel_id,
            guild_id,
            joined_at,
            left_at: None,
            duration_minutes: None,
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.left_at.is_none()
    }

    /// Whole minutes between join and `now`, floored, never negative.
    /// A leave stamped before the join (clock skew between shards) counts as zero.
    pub fn minutes_until(&self, now: DateTime<Utc>) -> i64 {
        (now - self.joined_at).num_minutes().max(0)
    }

    /// Close the session at `now`, returning the credited duration.
    /// Closing an already closed session returns the recorded duration unchanged.
    pub fn close(&mut self, now: DateTime<Utc>) -> i64 {
        if let Some(duration) = self.duration_minutes {
            return duration;
        }
        let duration = self.minutes_until(now);
        self.left_at = Some(now);
        self.duration_minutes = Some(duration);
        duration
    }

    /// Ordering used to pick "the most recent" open session: join time, then
    /// arrival sequence when join times tie.
    pub fn recency_key(&self) -> (DateTime<Utc>, Snowflake) {
        (self.joined_at, self.id)
    }
}
