//! Normalized activity events consumed by the ingest pipeline

mod activity_event;

pub use activity_event::{
    ActivityEvent, MemberJoinedEvent, MessagePostedEvent, ReactionAddedEvent, VoiceJoinedEvent,
    VoiceLeftEvent, VoiceMovedEvent,
};
