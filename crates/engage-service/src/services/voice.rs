//! Voice session tracker
//!
//! Opens a session on join and closes the most recent open one on leave,
//! crediting floored whole minutes to the user's durable voice counter.
//! All operations for one user run under that user's lock, and the close
//! itself is conditional, so a session is credited at most once.

use chrono::{DateTime, Utc};
use engage_core::entities::{UserStats, VoiceSession};
use engage_core::{Snowflake, StatCounter};
use tracing::{debug, info, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Result of a join
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A new session was opened
    Opened(VoiceSession),
    /// The user already had an open session in this channel
    AlreadyOpen,
}

/// Result of a leave
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    Closed {
        session: VoiceSession,
        duration_minutes: i64,
        /// Counters after crediting, when anything was credited
        stats: Option<UserStats>,
    },
    /// Leave without a matching join, or another caller closed it first
    NoOpenSession,
}

impl LeaveOutcome {
    /// Minutes credited by this leave
    pub fn credited_minutes(&self) -> i64 {
        match self {
            Self::Closed {
                duration_minutes, ..
            } => *duration_minutes,
            Self::NoOpenSession => 0,
        }
    }
}

/// Result of a channel switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchOutcome {
    pub left: LeaveOutcome,
    pub joined: JoinOutcome,
}

/// Voice session tracker
pub struct VoiceSessionTracker<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> VoiceSessionTracker<'a> {
    /// Create a new VoiceSessionTracker
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Record a join
    #[instrument(skip(self))]
    pub async fn on_join(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
        guild_id: Snowflake,
        now: DateTime<Utc>,
    ) -> ServiceResult<JoinOutcome> {
        let _lock = self.ctx.voice_locks().acquire(user_id).await;
        self.join_locked(user_id, channel_id, guild_id, now).await
    }

    /// Record a leave
    #[instrument(skip(self))]
    pub async fn on_leave(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
        now: DateTime<Utc>,
    ) -> ServiceResult<LeaveOutcome> {
        let _lock = self.ctx.voice_locks().acquire(user_id).await;
        self.leave_locked(user_id, channel_id, now).await
    }

    /// Record a move between channels: leave `from`, then join `to`, with
    /// nothing else for this user interleaving
    #[instrument(skip(self))]
    pub async fn on_switch(
        &self,
        user_id: Snowflake,
        from_channel_id: Snowflake,
        to_channel_id: Snowflake,
        guild_id: Snowflake,
        now: DateTime<Utc>,
    ) -> ServiceResult<SwitchOutcome> {
        let _lock = self.ctx.voice_locks().acquire(user_id).await;
        let left = self.leave_locked(user_id, from_channel_id, now).await?;
        let joined = self
            .join_locked(user_id, to_channel_id, guild_id, now)
            .await?;
        Ok(SwitchOutcome { left, joined })
    }

    async fn join_locked(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
        guild_id: Snowflake,
        now: DateTime<Utc>,
    ) -> ServiceResult<JoinOutcome> {
        if self
            .ctx
            .voice_repo()
            .find_latest_open(user_id, channel_id)
            .await?
            .is_some()
        {
            debug!(user_id = %user_id, channel_id = %channel_id, "Duplicate voice join ignored");
            return Ok(JoinOutcome::AlreadyOpen);
        }

        let session = VoiceSession::open(self.ctx.generate_id(), user_id, channel_id, guild_id, now);
        if !self.ctx.voice_repo().open(&session).await? {
            return Ok(JoinOutcome::AlreadyOpen);
        }

        debug!(session_id = %session.id, user_id = %user_id, channel_id = %channel_id, "Voice session opened");
        Ok(JoinOutcome::Opened(session))
    }

    async fn leave_locked(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
        now: DateTime<Utc>,
    ) -> ServiceResult<LeaveOutcome> {
        let Some(mut session) = self
            .ctx
            .voice_repo()
            .find_latest_open(user_id, channel_id)
            .await?
        else {
            debug!(user_id = %user_id, channel_id = %channel_id, "Voice leave without open session");
            return Ok(LeaveOutcome::NoOpenSession);
        };

        let duration_minutes = session.close(now);
        if !self
            .ctx
            .voice_repo()
            .close(session.id, now, duration_minutes)
            .await?
        {
            debug!(session_id = %session.id, "Voice session already closed");
            return Ok(LeaveOutcome::NoOpenSession);
        }

        let stats = if duration_minutes > 0 {
            let stats = self
                .ctx
                .stats_repo()
                .increment(user_id, StatCounter::VoiceMinutes, duration_minutes, now)
                .await?;
            Some(stats)
        } else {
            None
        };

        info!(
            session_id = %session.id,
            user_id = %user_id,
            channel_id = %channel_id,
            duration_minutes,
            "Voice session closed"
        );

        Ok(LeaveOutcome::Closed {
            session,
            duration_minutes,
            stats,
        })
    }
}
