//! Stats query service
//!
//! Read-through cache over the durable counters for display paths.
//! Reconciliation never reads through here.

use engage_core::entities::UserStats;
use engage_core::Snowflake;
use tracing::{debug, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Key prefix for cached user stats
const STATS_PREFIX: &str = "stats:";

/// Snapshot key: `stats:{user}`
pub fn stats_key(user_id: Snowflake) -> String {
    format!("{STATS_PREFIX}{user_id}")
}

/// Stats query service
pub struct StatsService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> StatsService<'a> {
    /// Create a new StatsService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Current counters for a user, possibly up to the cache TTL stale.
    /// `None` for a user never seen.
    #[instrument(skip(self))]
    pub async fn user_stats(&self, user_id: Snowflake) -> ServiceResult<Option<UserStats>> {
        let key = stats_key(user_id);

        match self
            .ctx
            .ephemeral(self.ctx.ephemeral_store().get_raw(&key))
            .await
        {
            Ok(Some(raw)) => match serde_json::from_str::<UserStats>(&raw) {
                Ok(stats) => return Ok(Some(stats)),
                Err(e) => debug!(error = %e, key = %key, "Ignoring unreadable stats snapshot"),
            },
            Ok(None) => {}
            Err(e) => debug!(error = %e, key = %key, "Stats cache lookup failed"),
        }

        let Some(stats) = self.ctx.stats_repo().find_stats(user_id).await? else {
            return Ok(None);
        };

        let ttl = self.ctx.settings().stats_cache_ttl;
        if ttl > 0 {
            if let Ok(raw) = serde_json::to_string(&stats) {
                if let Err(e) = self
                    .ctx
                    .ephemeral(self.ctx.ephemeral_store().set_raw(&key, &raw, ttl))
                    .await
                {
                    debug!(error = %e, key = %key, "Stats snapshot not stored");
                }
            }
        }

        Ok(Some(stats))
    }
}
