//! Fixed-window rate limiter, failing open

use engage_core::Snowflake;
use tracing::{debug, instrument, warn};

use super::context::ServiceContext;

/// Key prefix for rate-limit counters
const RATE_LIMIT_PREFIX: &str = "ratelimit:";

/// Counter key: `ratelimit:{user}:{command}`
pub fn rate_limit_key(user_id: Snowflake, command: &str) -> String {
    format!("{RATE_LIMIT_PREFIX}{user_id}:{command}")
}

/// Rate limiter
pub struct RateLimiter<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RateLimiter<'a> {
    /// Create a new RateLimiter
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Count one use of `command` and report whether it is within `limit`
    /// uses for the current window. The window starts at the first use.
    ///
    /// Returns `true` when the store cannot be reached.
    #[instrument(skip(self))]
    pub async fn allow(
        &self,
        user_id: Snowflake,
        command: &str,
        limit: u32,
        window_seconds: u64,
    ) -> bool {
        let key = rate_limit_key(user_id, command);
        match self
            .ctx
            .ephemeral(
                self.ctx
                    .ephemeral_store()
                    .incr_with_expiry(&key, window_seconds.max(1)),
            )
            .await
        {
            Ok(count) => {
                let allowed = count <= i64::from(limit);
                if !allowed {
                    debug!(user_id = %user_id, command, count, limit, "Rate limited");
                }
                allowed
            }
            Err(e) => {
                warn!(error = %e, key = %key, "Rate limiter unavailable, allowing");
                true
            }
        }
    }
}
