//! # engage-service
//!
//! Application layer: the voice session tracker, windowed activity index,
//! rate limiter, role rule engine and the read/ingest paths built on them.
//!
//! Services borrow a [`ServiceContext`] holding the storage ports, so every
//! service can run against PostgreSQL/Redis or against in-memory fakes.

pub mod services;

pub use services::{
    ActivityIndex, EngineSettings, FailureKind, IndexQuery, IngestOutcome, IngestPipeline,
    JoinOutcome, Leaderboard, LeaderboardService, LeaderboardSource, LeaveOutcome, RateLimiter,
    ReconcileFailure, ReconcileOutcome, ReconcilePolicy, RoleRuleEngine, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult, StatsService, SwitchOutcome, UserLocks,
    VoiceSessionTracker,
};
