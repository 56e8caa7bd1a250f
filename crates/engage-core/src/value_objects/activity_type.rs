//! Activity kinds tracked by the windowed index and the durable counters

use serde::{Deserialize, Serialize};

/// Kind of activity ranked by the windowed index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Messages,
    Reactions,
    Voice,
}

impl ActivityType {
    pub const ALL: [Self; 3] = [Self::Messages, Self::Reactions, Self::Voice];

    /// Key segment used in ephemeral store keys
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Messages => "messages",
            Self::Reactions => "reactions",
            Self::Voice => "voice",
        }
    }

    /// Durable counter holding the all-time value of this activity
    #[must_use]
    pub fn counter(&self) -> StatCounter {
        match self {
            Self::Messages => StatCounter::Messages,
            Self::Reactions => StatCounter::Reactions,
            Self::Voice => StatCounter::VoiceMinutes,
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "messages" | "message" => Ok(Self::Messages),
            "reactions" | "reaction" => Ok(Self::Reactions),
            "voice" => Ok(Self::Voice),
            _ => Err(format!("Invalid activity type: {s}")),
        }
    }
}

/// Durable per-user counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatCounter {
    Messages,
    Reactions,
    VoiceMinutes,
}

impl StatCounter {
    /// Column backing this counter in the stats table
    #[must_use]
    pub fn column(&self) -> &'static str {
        match self {
            Self::Messages => "message_count",
            Self::Reactions => "reaction_count",
            Self::VoiceMinutes => "voice_minutes",
        }
    }
}
