//! PostgreSQL implementation of StatsRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use engage_core::entities::{LeaderboardEntry, UserStats};
use engage_core::error::DomainError;
use engage_core::traits::{RepoResult, StatsRepository};
use engage_core::value_objects::{Snowflake, StatCounter};

use crate::models::{LeaderboardRowModel, UserStatsModel};

use super::error::map_db_error;

/// PostgreSQL implementation of StatsRepository
#[derive(Clone)]
pub struct PgStatsRepository {
    pool: PgPool,
}

impl PgStatsRepository {
    /// Create a new PgStatsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Column names come from `StatCounter::column`, never from input.
fn increment_sql(counter: StatCounter) -> String {
    let col = counter.column();
    format!(
        r#"
        INSERT INTO user_stats (user_id, {col}, last_active)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE
        SET {col} = user_stats.{col} + EXCLUDED.{col},
            last_active = GREATEST(user_stats.last_active, EXCLUDED.last_active)
        RETURNING user_id, message_count, reaction_count, voice_minutes, last_active
        "#
    )
}

fn top_sql(counter: StatCounter) -> String {
    let col = counter.column();
    format!(
        r#"
        SELECT s.user_id, s.{col} AS score
        FROM guild_members m
        JOIN user_stats s ON s.user_id = m.user_id
        WHERE m.guild_id = $1 AND s.{col} > 0
        ORDER BY s.{col} DESC, s.user_id ASC
        LIMIT $2
        "#
    )
}

#[async_trait]
impl StatsRepository for PgStatsRepository {
    #[instrument(skip(self))]
    async fn increment(
        &self,
        user_id: Snowflake,
        counter: StatCounter,
        amount: i64,
        at: DateTime<Utc>,
    ) -> RepoResult<UserStats> {
        if amount < 0 {
            return Err(DomainError::ValidationError(format!(
                "counter increment must be non-negative, got {amount}"
            )));
        }

        let sql = increment_sql(counter);
        let model = sqlx::query_as::<_, UserStatsModel>(&sql)
            .bind(user_id.into_inner())
            .bind(amount)
            .bind(at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(model.into())
    }

    #[instrument(skip(self))]
    async fn upsert_membership(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        at: DateTime<Utc>,
    ) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO guild_members (guild_id, user_id, first_seen, last_active)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (guild_id, user_id) DO UPDATE
            SET last_active = GREATEST(guild_members.last_active, EXCLUDED.last_active)
            "#,
        )
        .bind(guild_id.into_inner())
        .bind(user_id.into_inner())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_stats(&self, user_id: Snowflake) -> RepoResult<Option<UserStats>> {
        let result = sqlx::query_as::<_, UserStatsModel>(
            r#"
            SELECT user_id, message_count, reaction_count, voice_minutes, last_active
            FROM user_stats
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn top_by_counter(
        &self,
        guild_id: Snowflake,
        counter: StatCounter,
        limit: i64,
    ) -> RepoResult<Vec<LeaderboardEntry>> {
        let limit = limit.clamp(1, 100);
        let sql = top_sql(counter);

        let rows = sqlx::query_as::<_, LeaderboardRowModel>(&sql)
            .bind(guild_id.into_inner())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
