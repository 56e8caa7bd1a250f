//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in engage-core.

mod activity_log;
mod error;
mod role_assignment;
mod role_rule;
mod stats;
mod voice_session;

pub use activity_log::PgActivityLogRepository;
pub use role_assignment::PgRoleAssignmentRepository;
pub use role_rule::PgRoleRuleRepository;
pub use stats::PgStatsRepository;
pub use voice_session::PgVoiceSessionRepository;
