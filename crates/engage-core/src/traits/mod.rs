//! Storage ports
//!
//! The domain layer defines what it needs from the durable counter store and
//! the ephemeral cache; `engage-db` and `engage-cache` provide the adapters.

mod ephemeral;
mod repositories;

pub use ephemeral::{EphemeralStore, ScoredMember, StoreResult};
pub use repositories::{
    ActivityLogRepository, RepoResult, RoleAssignmentRepository, RoleRuleRepository,
    StatsRepository, VoiceSessionRepository,
};
