//! PostgreSQL implementation of RoleAssignmentRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use engage_core::entities::{GrantOutcome, RoleAssignment};
use engage_core::traits::{RepoResult, RoleAssignmentRepository};
use engage_core::value_objects::Snowflake;

use crate::models::RoleAssignmentModel;

use super::error::map_db_error;

/// PostgreSQL implementation of RoleAssignmentRepository
#[derive(Clone)]
pub struct PgRoleAssignmentRepository {
    pool: PgPool,
}

impl PgRoleAssignmentRepository {
    /// Create a new PgRoleAssignmentRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleAssignmentRepository for PgRoleAssignmentRepository {
    #[instrument(skip(self))]
    async fn find_by_user(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Vec<RoleAssignment>> {
        let results = sqlx::query_as::<_, RoleAssignmentModel>(
            r#"
            SELECT user_id, role_id, guild_id, reason, assigned_at
            FROM user_role_assignments
            WHERE guild_id = $1 AND user_id = $2
            ORDER BY assigned_at
            "#,
        )
        .bind(guild_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, assignment), fields(user_id = %assignment.user_id, role_id = %assignment.role_id))]
    async fn grant(&self, assignment: &RoleAssignment) -> RepoResult<GrantOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_role_assignments (user_id, role_id, guild_id, reason, assigned_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ON CONSTRAINT uq_user_role_assignment DO NOTHING
            "#,
        )
        .bind(assignment.user_id.into_inner())
        .bind(assignment.role_id.into_inner())
        .bind(assignment.guild_id.into_inner())
        .bind(&assignment.reason)
        .bind(assignment.assigned_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 1 {
            Ok(GrantOutcome::Granted)
        } else {
            Ok(GrantOutcome::AlreadyGranted)
        }
    }

    #[instrument(skip(self))]
    async fn revoke(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_role_assignments
            WHERE guild_id = $1 AND user_id = $2 AND role_id = $3
            "#,
        )
        .bind(guild_id.into_inner())
        .bind(user_id.into_inner())
        .bind(role_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
