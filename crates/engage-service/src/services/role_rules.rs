//! Role rule engine
//!
//! Computes which automated roles a user should hold from their durable
//! counters and applies only the difference. Grants and revokes are each
//! idempotent at the storage layer, so concurrent reconciliations of the
//! same user converge without a lock.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use engage_core::entities::{GrantOutcome, RoleAssignment, RoleRule};
use engage_core::Snowflake;
use tracing::{debug, error, info, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Changes made by one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Names of the rules whose role was newly granted by this pass
    pub granted: Vec<String>,
    /// Roles removed by this pass
    pub revoked: Vec<Snowflake>,
    /// Writes that failed; the other rules were still applied
    pub failed: Vec<ReconcileFailure>,
}

impl ReconcileOutcome {
    /// Nothing changed and nothing failed
    pub fn is_noop(&self) -> bool {
        self.granted.is_empty() && self.revoked.is_empty() && self.failed.is_empty()
    }
}

/// One grant or revoke that could not be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileFailure {
    pub rule: String,
    pub role_id: Snowflake,
    pub error: String,
}

/// Rules grouped by target role
struct RoleTarget<'r> {
    /// First rule naming the role, used to label revokes
    first: &'r RoleRule,
    /// First rule that the user satisfies, if any
    eligible: Option<&'r RoleRule>,
}

fn group_by_role<'r>(
    rules: &'r [RoleRule],
    stats: &engage_core::UserStats,
) -> BTreeMap<Snowflake, RoleTarget<'r>> {
    let mut targets: BTreeMap<Snowflake, RoleTarget<'r>> = BTreeMap::new();
    for rule in rules.iter().filter(|r| r.enabled) {
        let target = targets.entry(rule.role_id).or_insert(RoleTarget {
            first: rule,
            eligible: None,
        });
        if target.eligible.is_none() && rule.is_satisfied_by(stats) {
            target.eligible = Some(rule);
        }
    }
    targets
}

/// Role rule engine
pub struct RoleRuleEngine<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RoleRuleEngine<'a> {
    /// Create a new RoleRuleEngine
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Bring the user's automated roles in `guild_id` in line with the
    /// guild's enabled rules.
    ///
    /// Loading rules, stats or current assignments is all-or-nothing; a
    /// failing grant or revoke is recorded in `failed` and the pass goes on.
    #[instrument(skip(self))]
    pub async fn reconcile(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<ReconcileOutcome> {
        let rules = self.ctx.rule_repo().find_enabled_by_guild(guild_id).await?;
        if rules.is_empty() {
            return Ok(ReconcileOutcome::default());
        }

        let Some(stats) = self.ctx.stats_repo().find_stats(user_id).await? else {
            debug!(user_id = %user_id, "No stats for user, nothing to reconcile");
            return Ok(ReconcileOutcome::default());
        };

        let held: HashSet<Snowflake> = self
            .ctx
            .assignment_repo()
            .find_by_user(guild_id, user_id)
            .await?
            .into_iter()
            .map(|a| a.role_id)
            .collect();

        let mut outcome = ReconcileOutcome::default();

        for (role_id, target) in group_by_role(&rules, &stats) {
            let has_role = held.contains(&role_id);
            match target.eligible {
                Some(rule) if !has_role => {
                    self.grant(guild_id, user_id, rule, &mut outcome).await;
                }
                None if has_role => {
                    self.revoke(guild_id, user_id, target.first, &mut outcome)
                        .await;
                }
                _ => {}
            }
        }

        Ok(outcome)
    }

    async fn grant(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        rule: &RoleRule,
        outcome: &mut ReconcileOutcome,
    ) {
        let assignment = RoleAssignment {
            user_id,
            role_id: rule.role_id,
            guild_id,
            reason: rule.grant_reason(),
            assigned_at: Utc::now(),
        };

        match self.ctx.assignment_repo().grant(&assignment).await {
            Ok(GrantOutcome::Granted) => {
                info!(
                    guild_id = %guild_id,
                    user_id = %user_id,
                    role_id = %rule.role_id,
                    rule = %rule.name,
                    "Role granted"
                );
                outcome.granted.push(rule.name.clone());
            }
            Ok(GrantOutcome::AlreadyGranted) => {
                debug!(role_id = %rule.role_id, rule = %rule.name, "Role already granted");
            }
            Err(e) => {
                error!(error = %e, role_id = %rule.role_id, rule = %rule.name, "Role grant failed");
                outcome.failed.push(ReconcileFailure {
                    rule: rule.name.clone(),
                    role_id: rule.role_id,
                    error: e.to_string(),
                });
            }
        }
    }

    async fn revoke(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        rule: &RoleRule,
        outcome: &mut ReconcileOutcome,
    ) {
        match self
            .ctx
            .assignment_repo()
            .revoke(guild_id, user_id, rule.role_id)
            .await
        {
            Ok(true) => {
                info!(
                    guild_id = %guild_id,
                    user_id = %user_id,
                    role_id = %rule.role_id,
                    rule = %rule.name,
                    "Role revoked"
                );
                outcome.revoked.push(rule.role_id);
            }
            Ok(false) => {
                debug!(role_id = %rule.role_id, "Role already revoked");
            }
            Err(e) => {
                error!(error = %e, role_id = %rule.role_id, rule = %rule.name, "Role revoke failed");
                outcome.failed.push(ReconcileFailure {
                    rule: rule.name.clone(),
                    role_id: rule.role_id,
                    error: e.to_string(),
                });
            }
        }
    }
}
