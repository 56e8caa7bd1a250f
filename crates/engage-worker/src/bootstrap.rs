//! Infrastructure setup
//!
//! Creates the database and Redis pools and assembles the service context.

use std::sync::Arc;

use engage_cache::{RedisEphemeralStore, RedisPool};
use engage_common::{AppConfig, AppError, AppResult};
use engage_core::SnowflakeGenerator;
use engage_db::{
    PgActivityLogRepository, PgPool, PgRoleAssignmentRepository, PgRoleRuleRepository,
    PgStatsRepository, PgVoiceSessionRepository,
};
use engage_service::{EngineSettings, ServiceContext, ServiceContextBuilder};
use tracing::{info, warn};

/// Live connection pools
#[derive(Debug, Clone)]
pub struct Infrastructure {
    pub pool: PgPool,
    pub redis: RedisPool,
}

impl Infrastructure {
    /// Connect to PostgreSQL (required) and set up the Redis pool
    /// (optional at runtime: an unreachable Redis only degrades accelerators)
    pub async fn connect(config: &AppConfig) -> AppResult<Self> {
        info!("Connecting to PostgreSQL...");
        let db_config = engage_db::DatabaseConfig::from(&config.database);
        let pool = engage_db::create_pool(&db_config)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        info!("PostgreSQL connection established");

        if let Some(dir) = &config.database.migrations_dir {
            engage_db::run_migrations(&pool, dir)
                .await
                .map_err(|e| AppError::Database(format!("Migrations failed: {e}")))?;
        }

        let redis = RedisPool::from_config(&config.redis).map_err(|e| AppError::Cache(e.to_string()))?;
        match redis.health_check().await {
            Ok(()) => info!("Redis connection established"),
            Err(e) => warn!(error = %e, "Redis unreachable, running with degraded accelerators"),
        }

        Ok(Self { pool, redis })
    }

    /// Close the database pool, waiting for checked-out connections
    pub async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }
}

/// Build the service context over the live adapters
pub fn create_service_context(infra: &Infrastructure, config: &AppConfig) -> AppResult<ServiceContext> {
    let pool = infra.pool.clone();

    ServiceContextBuilder::new()
        .stats_repo(Arc::new(PgStatsRepository::new(pool.clone())))
        .voice_repo(Arc::new(PgVoiceSessionRepository::new(pool.clone())))
        .rule_repo(Arc::new(PgRoleRuleRepository::new(pool.clone())))
        .assignment_repo(Arc::new(PgRoleAssignmentRepository::new(pool.clone())))
        .activity_log_repo(Arc::new(PgActivityLogRepository::new(pool)))
        .ephemeral(Arc::new(RedisEphemeralStore::new(infra.redis.clone())))
        .snowflake_generator(Arc::new(SnowflakeGenerator::new(config.engagement.worker_id)))
        .settings(EngineSettings::from(&config.engagement))
        .build()
        .map_err(AppError::from)
}
