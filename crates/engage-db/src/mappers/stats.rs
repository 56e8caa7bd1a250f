//! UserStats / LeaderboardEntry <- model mappers

use engage_core::entities::{LeaderboardEntry, UserStats};
use engage_core::value_objects::Snowflake;

use crate::models::{LeaderboardRowModel, UserStatsModel};

impl From<UserStatsModel> for UserStats {
    fn from(model: UserStatsModel) -> Self {
        UserStats {
            user_id: Snowflake::new(model.user_id),
            message_count: model.message_count,
            reaction_count: model.reaction_count,
            voice_minutes: model.voice_minutes,
            last_active: model.last_active,
        }
    }
}

impl From<LeaderboardRowModel> for LeaderboardEntry {
    fn from(model: LeaderboardRowModel) -> Self {
        LeaderboardEntry::new(Snowflake::new(model.user_id), model.score)
    }
}
