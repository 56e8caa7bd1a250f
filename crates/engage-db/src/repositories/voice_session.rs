//! PostgreSQL implementation of VoiceSessionRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use engage_core::entities::VoiceSession;
use engage_core::traits::{RepoResult, VoiceSessionRepository};
use engage_core::value_objects::Snowflake;

use crate::models::VoiceSessionModel;

use super::error::{is_unique_violation, map_db_error};

/// PostgreSQL implementation of VoiceSessionRepository
#[derive(Clone)]
pub struct PgVoiceSessionRepository {
    pool: PgPool,
}

impl PgVoiceSessionRepository {
    /// Create a new PgVoiceSessionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoiceSessionRepository for PgVoiceSessionRepository {
    #[instrument(skip(self))]
    async fn find_latest_open(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
    ) -> RepoResult<Option<VoiceSession>> {
        let result = sqlx::query_as::<_, VoiceSessionModel>(
            r#"
            SELECT id, user_id, channel_id, guild_id, joined_at, left_at, duration_minutes
            FROM voice_sessions
            WHERE user_id = $1 AND channel_id = $2 AND left_at IS NULL
            ORDER BY joined_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.into_inner())
        .bind(channel_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self, session), fields(session_id = %session.id))]
    async fn open(&self, session: &VoiceSession) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO voice_sessions (id, user_id, channel_id, guild_id, joined_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.id.into_inner())
        .bind(session.user_id.into_inner())
        .bind(session.channel_id.into_inner())
        .bind(session.guild_id.into_inner())
        .bind(session.joined_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            // The partial unique index rejects a second open session
            Err(e) if is_unique_violation(&e) => {
                debug!("Open voice session already exists");
                Ok(false)
            }
            Err(e) => Err(map_db_error(e)),
        }
    }

    #[instrument(skip(self))]
    async fn close(
        &self,
        session_id: Snowflake,
        left_at: DateTime<Utc>,
        duration_minutes: i64,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE voice_sessions
            SET left_at = $2, duration_minutes = $3
            WHERE id = $1 AND left_at IS NULL
            "#,
        )
        .bind(session_id.into_inner())
        .bind(left_at)
        .bind(duration_minutes.max(0))
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }
}
