//! Repository traits (ports) for the durable counter store
//!
//! Every write here must be atomic at the storage layer: counters are bumped
//! with `count = count + n`, sessions are closed conditionally and role
//! assignments rely on a uniqueness constraint. Services never do
//! read-modify-write on these records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    ActivityRecord, GrantOutcome, LeaderboardEntry, RoleAssignment, RoleRule, UserStats, VoiceSession,
};
use crate::error::DomainError;
use crate::value_objects::{Snowflake, StatCounter};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Stats Repository
// ============================================================================

#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Atomically add `amount` to one counter, creating the stats row if
    /// needed. Returns the row as it is after the increment.
    async fn increment(
        &self,
        user_id: Snowflake,
        counter: StatCounter,
        amount: i64,
        at: DateTime<Utc>,
    ) -> RepoResult<UserStats>;

    /// Record that the user was active in a guild
    async fn upsert_membership(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        at: DateTime<Utc>,
    ) -> RepoResult<()>;

    /// Current stats, or `None` for a user never seen
    async fn find_stats(&self, user_id: Snowflake) -> RepoResult<Option<UserStats>>;

    /// All-time ranking of guild members by one counter, score descending
    /// then user id ascending
    async fn top_by_counter(
        &self,
        guild_id: Snowflake,
        counter: StatCounter,
        limit: i64,
    ) -> RepoResult<Vec<LeaderboardEntry>>;
}

// ============================================================================
// Activity Log Repository
// ============================================================================

#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    /// Append one row. Rows are never updated or deleted by the engine.
    async fn append(&self, record: &ActivityRecord) -> RepoResult<()>;
}

// ============================================================================
// Voice Session Repository
// ============================================================================

#[async_trait]
pub trait VoiceSessionRepository: Send + Sync {
    /// Most recent open session for (user, channel) by join time, then id
    async fn find_latest_open(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
    ) -> RepoResult<Option<VoiceSession>>;

    /// Insert an open session. Returns `false` when an open session for the
    /// same (user, channel) already exists.
    async fn open(&self, session: &VoiceSession) -> RepoResult<bool>;

    /// Close the session only if it is still open. Returns `false` if another
    /// caller closed it first.
    async fn close(
        &self,
        session_id: Snowflake,
        left_at: DateTime<Utc>,
        duration_minutes: i64,
    ) -> RepoResult<bool>;
}

// ============================================================================
// Role Rule Repository
// ============================================================================

#[async_trait]
pub trait RoleRuleRepository: Send + Sync {
    /// Enabled rules for a guild
    async fn find_enabled_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<RoleRule>>;
}

// ============================================================================
// Role Assignment Repository
// ============================================================================

#[async_trait]
pub trait RoleAssignmentRepository: Send + Sync {
    /// Automated assignments a user holds in a guild
    async fn find_by_user(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Vec<RoleAssignment>>;

    /// Create the assignment. A duplicate resolves to `AlreadyGranted`, never an error.
    async fn grant(&self, assignment: &RoleAssignment) -> RepoResult<GrantOutcome>;

    /// Delete the assignment. Returns `false` if it was already gone.
    async fn revoke(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> RepoResult<bool>;
}
