//! PostgreSQL implementation of ActivityLogRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use engage_core::entities::ActivityRecord;
use engage_core::traits::{ActivityLogRepository, RepoResult};
use engage_core::value_objects::Snowflake;

use super::error::map_db_error;

/// PostgreSQL implementation of ActivityLogRepository
#[derive(Clone)]
pub struct PgActivityLogRepository {
    pool: PgPool,
}

impl PgActivityLogRepository {
    /// Create a new PgActivityLogRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for PgActivityLogRepository {
    #[instrument(skip(self, record), fields(record_id = %record.id, kind = %record.kind))]
    async fn append(&self, record: &ActivityRecord) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log
                (id, guild_id, user_id, kind, channel_id, message_id, emoji, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id.into_inner())
        .bind(record.guild_id.into_inner())
        .bind(record.user_id.into_inner())
        .bind(record.kind.as_str())
        .bind(record.channel_id.map(Snowflake::into_inner))
        .bind(record.message_id.map(Snowflake::into_inner))
        .bind(record.emoji.as_deref())
        .bind(record.occurred_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}
