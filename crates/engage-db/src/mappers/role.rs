//! RoleRule / RoleAssignment <- model mappers

use engage_core::entities::{RoleAssignment, RoleRule};
use engage_core::value_objects::Snowflake;

use crate::models::{RoleAssignmentModel, RoleRuleModel};

impl From<RoleRuleModel> for RoleRule {
    fn from(model: RoleRuleModel) -> Self {
        RoleRule {
            id: Snowflake::new(model.id),
            guild_id: Snowflake::new(model.guild_id),
            name: model.name,
            min_messages: model.min_messages,
            min_reactions: model.min_reactions,
            min_voice_minutes: model.min_voice_minutes,
            role_id: Snowflake::new(model.role_id),
            enabled: model.enabled,
        }
    }
}

impl From<RoleAssignmentModel> for RoleAssignment {
    fn from(model: RoleAssignmentModel) -> Self {
        RoleAssignment {
            user_id: Snowflake::new(model.user_id),
            role_id: Snowflake::new(model.role_id),
            guild_id: Snowflake::new(model.guild_id),
            reason: model.reason,
            assigned_at: model.assigned_at,
        }
    }
}
