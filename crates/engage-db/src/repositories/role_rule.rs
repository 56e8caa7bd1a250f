//! PostgreSQL implementation of RoleRuleRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use engage_core::entities::RoleRule;
use engage_core::traits::{RepoResult, RoleRuleRepository};
use engage_core::value_objects::Snowflake;

use crate::models::RoleRuleModel;

use super::error::map_db_error;

/// PostgreSQL implementation of RoleRuleRepository
#[derive(Clone)]
pub struct PgRoleRuleRepository {
    pool: PgPool,
}

impl PgRoleRuleRepository {
    /// Create a new PgRoleRuleRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRuleRepository for PgRoleRuleRepository {
    #[instrument(skip(self))]
    async fn find_enabled_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<RoleRule>> {
        let results = sqlx::query_as::<_, RoleRuleModel>(
            r#"
            SELECT id, guild_id, name, min_messages, min_reactions, min_voice_minutes,
                   role_id, enabled
            FROM role_rules
            WHERE guild_id = $1 AND enabled
            ORDER BY id
            "#,
        )
        .bind(guild_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Into::into).collect())
    }
}
