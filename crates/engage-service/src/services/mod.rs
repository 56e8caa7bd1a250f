//! Engine services
//!
//! Durable paths (voice tracking, reconciliation, ingest) return
//! `ServiceResult`. Accelerator paths (activity index, rate limiter,
//! leaderboard cache) absorb ephemeral store failures and report them
//! through their outcome types.

pub mod activity_index;
pub mod context;
pub mod error;
pub mod ingest;
pub mod leaderboard;
pub mod locks;
pub mod rate_limit;
pub mod role_rules;
pub mod stats;
pub mod voice;

pub use activity_index::{ActivityIndex, IndexQuery};
pub use context::{EngineSettings, ServiceContext, ServiceContextBuilder};
pub use error::{FailureKind, ServiceError, ServiceResult};
pub use ingest::{IngestOutcome, IngestPipeline, ReconcilePolicy};
pub use leaderboard::{Leaderboard, LeaderboardService, LeaderboardSource};
pub use locks::UserLocks;
pub use rate_limit::RateLimiter;
pub use role_rules::{ReconcileFailure, ReconcileOutcome, RoleRuleEngine};
pub use stats::StatsService;
pub use voice::{JoinOutcome, LeaveOutcome, SwitchOutcome, VoiceSessionTracker};
