//! Redis-backed [`EphemeralStore`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use redis::{AsyncCommands, Script};
use tracing::{debug, instrument};

use engage_core::traits::{EphemeralStore, ScoredMember, StoreResult};

use crate::pool::{RedisPool, RedisResult};

/// Key prefix for temporary union targets
const SCRATCH_PREFIX: &str = "scratch:union:";

/// INCR, setting the expiry only when the counter is created
const INCR_WITH_EXPIRY: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
";

/// Redis implementation of the ephemeral store
#[derive(Clone)]
pub struct RedisEphemeralStore {
    pool: RedisPool,
    incr_script: Script,
}

impl std::fmt::Debug for RedisEphemeralStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisEphemeralStore")
            .field("pool", &self.pool)
            .finish()
    }
}

impl RedisEphemeralStore {
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            incr_script: Script::new(INCR_WITH_EXPIRY),
        }
    }

    async fn union_into_scratch(
        &self,
        conn: &mut deadpool_redis::Connection,
        scratch: &str,
        keys: &[String],
        limit: usize,
        scratch_ttl_seconds: u64,
    ) -> RedisResult<Vec<ScoredMember>> {
        let stop = limit.saturating_sub(1) as isize;
        let (_, _, top): (i64, bool, Vec<(String, f64)>) = redis::pipe()
            .cmd("ZUNIONSTORE")
            .arg(scratch)
            .arg(keys.len())
            .arg(keys)
            .expire(scratch, ttl_arg(scratch_ttl_seconds))
            .zrevrange_withscores(scratch, 0, stop)
            .query_async(conn)
            .await?;

        // Members tied with the last returned score may have been cut by the
        // index range; fetch every member at or above that score instead.
        let members = match top.last() {
            Some((_, boundary)) if top.len() >= limit => {
                conn.zrevrangebyscore_withscores::<_, _, _, Vec<(String, f64)>>(
                    scratch, "+inf", *boundary,
                )
                .await?
            }
            _ => top,
        };

        Ok(members
            .into_iter()
            .map(|(member, score)| ScoredMember { member, score })
            .collect())
    }
}

#[async_trait]
impl EphemeralStore for RedisEphemeralStore {
    #[instrument(skip(self))]
    async fn zincr_with_ttl(
        &self,
        key: &str,
        member: &str,
        amount: f64,
        ttl_seconds: u64,
    ) -> StoreResult<()> {
        let mut conn = self.pool.get().await?;
        redis::pipe()
            .atomic()
            .zincr(key, member, amount)
            .ignore()
            .expire(key, ttl_arg(ttl_seconds))
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(crate::RedisPoolError::from)?;
        Ok(())
    }

    #[instrument(skip(self, keys), fields(buckets = keys.len()))]
    async fn union_top(
        &self,
        keys: &[String],
        limit: usize,
        scratch_ttl_seconds: u64,
    ) -> StoreResult<Vec<ScoredMember>> {
        if keys.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.get().await?;
        let scratch = scratch_key();
        let result = self
            .union_into_scratch(&mut conn, &scratch, keys, limit, scratch_ttl_seconds)
            .await;

        // The scratch key carries a TTL, so a failed delete only delays cleanup
        if let Err(e) = conn.del::<_, ()>(&scratch).await {
            debug!(error = %e, key = %scratch, "Failed to delete scratch key");
        }

        Ok(result?)
    }

    #[instrument(skip(self))]
    async fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(crate::RedisPoolError::from)?;
        Ok(value)
    }

    #[instrument(skip(self, value))]
    async fn set_raw(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreResult<()> {
        let mut conn = self.pool.get().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds.max(1))
            .await
            .map_err(crate::RedisPoolError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn incr_with_expiry(&self, key: &str, window_seconds: u64) -> StoreResult<i64> {
        let mut conn = self.pool.get().await?;
        let count: i64 = self
            .incr_script
            .key(key)
            .arg(window_seconds.max(1))
            .invoke_async(&mut conn)
            .await
            .map_err(crate::RedisPoolError::from)?;
        Ok(count)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.pool.health_check().await?;
        Ok(())
    }
}

/// EXPIRE takes a signed TTL; zero would delete the key outright
fn ttl_arg(ttl_seconds: u64) -> i64 {
    i64::try_from(ttl_seconds.max(1)).unwrap_or(i64::MAX)
}

/// Unique-enough name for a temporary union target
fn scratch_key() -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!(
        "{SCRATCH_PREFIX}{}:{nanos}:{}",
        std::process::id(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    )
}
