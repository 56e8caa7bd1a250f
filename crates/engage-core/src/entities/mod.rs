//! Domain entities - core business objects

mod activity_log;
mod leaderboard;
mod role_rule;
mod stats;
mod voice_session;

pub use activity_log::ActivityRecord;
pub use leaderboard::LeaderboardEntry;
pub use role_rule::{GrantOutcome, RoleAssignment, RoleRule};
pub use stats::{GuildMembership, UserStats};
pub use voice_session::VoiceSession;
