//! VoiceSession <- model mapper

use engage_core::entities::VoiceSession;
use engage_core::value_objects::Snowflake;

use crate::models::VoiceSessionModel;

impl From<VoiceSessionModel> for VoiceSession {
    fn from(model: VoiceSessionModel) -> Self {
        VoiceSession {
            id: Snowflake::new(model.id),
            user_id: Snowflake::new(model.user_id),
            channel_id: Snowflake::new(model.channel_id),
            guild_id: Snowflake::new(model.guild_id),
            joined_at: model.joined_at,
            left_at: model.left_at,
            duration_minutes: model.duration_minutes,
        }
    }
}
