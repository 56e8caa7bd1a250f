//! # engage-cache
//!
//! Redis implementation of the ephemeral store port.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Ranked sets**: day-bucketed sorted sets and their windowed union
//! - **Counters**: increment-with-expiry through a Lua script
//! - **Snapshots**: plain string values with a TTL
//!
//! Nothing stored here is authoritative. Errors surface as
//! `DomainError::CacheUnavailable` so callers can apply their degrade policy.
//!
//! ## Example
//!
//! ```ignore
//! use engage_cache::{RedisEphemeralStore, RedisPool, RedisPoolConfig};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let store = RedisEphemeralStore::new(pool);
//! let count = store.incr_with_expiry("ratelimit:1:rank", 60).await?;
//! ```

pub mod pool;
pub mod store;

// Re-export pool types
pub use pool::{create_shared_pool, RedisPool, RedisPoolConfig, RedisPoolError, RedisResult, SharedRedisPool};

// Re-export store types
pub use store::RedisEphemeralStore;
