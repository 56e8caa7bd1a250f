//! Activity log entity - one append-only row per counted message or reaction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::ActivityEvent;
use crate::value_objects::{ActivityType, Snowflake};

/// Logged message or reaction. Rows are never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub kind: ActivityType,
    /// Channel a message was posted in
    pub channel_id: Option<Snowflake>,
    /// Message a reaction was added to
    pub message_id: Option<Snowflake>,
    pub emoji: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// Log row for a message or reaction event; `None` for every other event
    pub fn from_event(id: Snowflake, event: &ActivityEvent) -> Option<Self> {
        match event {
            ActivityEvent::MessagePosted(e) => Some(Self {
                id,
                guild_id: e.guild_id,
                user_id: e.user_id,
                kind: ActivityType::Messages,
                channel_id: Some(e.channel_id),
                message_id: None,
                emoji: None,
                occurred_at: e.timestamp,
            }),
            ActivityEvent::ReactionAdded(e) => Some(Self {
                id,
                guild_id: e.guild_id,
                user_id: e.user_id,
                kind: ActivityType::Reactions,
                channel_id: None,
                message_id: Some(e.message_id),
                emoji: Some(e.emoji.trim().to_string()),
                occurred_at: e.timestamp,
            }),
            ActivityEvent::VoiceJoined(_)
            | ActivityEvent::VoiceLeft(_)
            | ActivityEvent::VoiceMoved(_)
            | ActivityEvent::MemberJoined(_) => None,
        }
    }
}
