//! Database models - SQLx-compatible structs for PostgreSQL tables

mod role;
mod stats;
mod voice_session;

pub use role::{RoleAssignmentModel, RoleRuleModel};
pub use stats::{LeaderboardRowModel, UserStatsModel};
pub use voice_session::VoiceSessionModel;
