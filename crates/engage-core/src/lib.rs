//! # engage-core
//!
//! Domain layer for the engagement engine: entities, the activity event union,
//! domain errors and the storage ports implemented by `engage-db` and
//! `engage-cache`. This crate has no infrastructure dependencies.

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    ActivityRecord, GrantOutcome, GuildMembership, LeaderboardEntry, RoleAssignment, RoleRule,
    UserStats, VoiceSession,
};
pub use error::DomainError;
pub use events::ActivityEvent;
pub use traits::{
    ActivityLogRepository, EphemeralStore, RepoResult, RoleAssignmentRepository,
    RoleRuleRepository, ScoredMember, StatsRepository, StoreResult, VoiceSessionRepository,
};
pub use value_objects::{ActivityType, Snowflake, SnowflakeGenerator, SnowflakeParseError, StatCounter};
