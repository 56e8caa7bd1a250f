//! Activity events - the closed set of platform events the engine reacts to
//!
//! Events arrive as tagged JSON. Bot-originated events are filtered before
//! they get here; everything in this union is treated as human activity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// All activity events understood by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityEvent {
    MessagePosted(MessagePostedEvent),
    ReactionAdded(ReactionAddedEvent),
    VoiceJoined(VoiceJoinedEvent),
    VoiceLeft(VoiceLeftEvent),
    VoiceMoved(VoiceMovedEvent),
    MemberJoined(MemberJoinedEvent),
}

impl ActivityEvent {
    /// Parse and validate one event from its wire form
    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        let event: Self = serde_json::from_str(raw)
            .map_err(|e| DomainError::ValidationError(format!("malformed event: {e}")))?;
        event.validate()?;
        Ok(event)
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MessagePosted(_) => "MESSAGE_POSTED",
            Self::ReactionAdded(_) => "REACTION_ADDED",
            Self::VoiceJoined(_) => "VOICE_JOINED",
            Self::VoiceLeft(_) => "VOICE_LEFT",
            Self::VoiceMoved(_) => "VOICE_MOVED",
            Self::MemberJoined(_) => "MEMBER_JOINED",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::MessagePosted(e) => e.timestamp,
            Self::ReactionAdded(e) => e.timestamp,
            Self::VoiceJoined(e) => e.timestamp,
            Self::VoiceLeft(e) => e.timestamp,
            Self::VoiceMoved(e) => e.timestamp,
            Self::MemberJoined(e) => e.timestamp,
        }
    }

    pub fn guild_id(&self) -> Snowflake {
        match self {
            Self::MessagePosted(e) => e.guild_id,
            Self::ReactionAdded(e) => e.guild_id,
            Self::VoiceJoined(e) => e.guild_id,
            Self::VoiceLeft(e) => e.guild_id,
            Self::VoiceMoved(e) => e.guild_id,
            Self::MemberJoined(e) => e.guild_id,
        }
    }

    pub fn user_id(&self) -> Snowflake {
        match self {
            Self::MessagePosted(e) => e.user_id,
            Self::ReactionAdded(e) => e.user_id,
            Self::VoiceJoined(e) => e.user_id,
            Self::VoiceLeft(e) => e.user_id,
            Self::VoiceMoved(e) => e.user_id,
            Self::MemberJoined(e) => e.user_id,
        }
    }

    /// Check required fields. Serde already guarantees presence; this rejects
    /// values that are present but meaningless.
    pub fn validate(&self) -> Result<(), DomainError> {
        require_id("guild_id", self.guild_id())?;
        require_id("user_id", self.user_id())?;

        match self {
            Self::MessagePosted(e) => require_id("channel_id", e.channel_id),
            Self::ReactionAdded(e) => {
                require_id("message_id", e.message_id)?;
                if e.emoji.trim().is_empty() {
                    return Err(DomainError::ValidationError("emoji must not be empty".into()));
                }
                Ok(())
            }
            Self::VoiceJoined(e) => require_id("channel_id", e.channel_id),
            Self::VoiceLeft(e) => require_id("channel_id", e.channel_id),
            Self::VoiceMoved(e) => {
                require_id("from_channel_id", e.from_channel_id)?;
                require_id("to_channel_id", e.to_channel_id)?;
                if e.from_channel_id == e.to_channel_id {
                    return Err(DomainError::ValidationError(
                        "voice move must change channel".into(),
                    ));
                }
                Ok(())
            }
            Self::MemberJoined(_) => Ok(()),
        }
    }
}

fn require_id(field: &str, id: Snowflake) -> Result<(), DomainError> {
    if id.is_zero() {
        return Err(DomainError::ValidationError(format!("{field} is required")));
    }
    Ok(())
}

// ============================================================================
// Event Structs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePostedEvent {
    pub guild_id: Snowflake,
    pub channel_id: Snowflake,
    pub user_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionAddedEvent {
    pub guild_id: Snowflake,
    pub message_id: Snowflake,
    pub user_id: Snowflake,
    pub emoji: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceJoinedEvent {
    pub guild_id: Snowflake,
    pub channel_id: Snowflake,
    pub user_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceLeftEvent {
    pub guild_id: Snowflake,
    pub channel_id: Snowflake,
    pub user_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceMovedEvent {
    pub guild_id: Snowflake,
    pub from_channel_id: Snowflake,
    pub to_channel_id: Snowflake,
    pub user_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberJoinedEvent {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}
