//! Ephemeral store adapters

mod redis_store;

pub use redis_store::RedisEphemeralStore;
