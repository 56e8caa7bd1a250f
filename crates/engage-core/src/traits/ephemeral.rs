//! Ephemeral store port
//!
//! The ephemeral store backs accelerators only: the windowed activity index,
//! rate-limit counters and cached snapshots. Anything kept here may expire or
//! vanish, so every caller has a degrade path for `Err`.

use async_trait::async_trait;

use crate::error::DomainError;

/// Result type for ephemeral store operations
pub type StoreResult<T> = Result<T, DomainError>;

/// Member of a ranked set with its score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMember {
    pub member: String,
    pub score: f64,
}

#[async_trait]
pub trait EphemeralStore: Send + Sync {
    /// Add `amount` to `member`'s score in the ranked set at `key` and
    /// (re)set the key's TTL
    async fn zincr_with_ttl(
        &self,
        key: &str,
        member: &str,
        amount: f64,
        ttl_seconds: u64,
    ) -> StoreResult<()>;

    /// Sum the ranked sets at `keys` and return the highest scores.
    ///
    /// Returns at least `limit` members when that many exist, plus any
    /// further members tied with the lowest returned score, so callers can
    /// apply their own tie-break. Any temporary merge key must carry
    /// `scratch_ttl_seconds` and be removed before returning.
    async fn union_top(
        &self,
        keys: &[String],
        limit: usize,
        scratch_ttl_seconds: u64,
    ) -> StoreResult<Vec<ScoredMember>>;

    async fn get_raw(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set_raw(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreResult<()>;

    /// Atomically increment the counter at `key`; the first increment of a
    /// window sets its expiry. Returns the post-increment count.
    async fn incr_with_expiry(&self, key: &str, window_seconds: u64) -> StoreResult<i64>;

    async fn ping(&self) -> StoreResult<()>;
}
