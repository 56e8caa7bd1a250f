//! Ingest pipeline
//!
//! Routes one validated activity event through the durable write path
//! (membership, activity log, counters or voice sessions), then the windowed
//! index, then (per [`ReconcilePolicy`]) the role rule engine. Durable failures are returned; index failures are not.

use chrono::{DateTime, Utc};
use engage_core::entities::{ActivityRecord, UserStats};
use engage_core::{ActivityEvent, ActivityType, Snowflake, StatCounter};
use tracing::{debug, instrument};

use super::activity_index::ActivityIndex;
use super::context::ServiceContext;
use super::error::ServiceResult;
use super::role_rules::{ReconcileOutcome, RoleRuleEngine};
use super::voice::{JoinOutcome, LeaveOutcome, SwitchOutcome, VoiceSessionTracker};

/// When ingestion triggers a role reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Reconcile when a message or reaction counter reaches a multiple of
    /// this value; 0 disables count triggers
    pub every_n: u64,
    /// Reconcile after a voice session closes with credited minutes
    pub on_voice_leave: bool,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            every_n: 10,
            on_voice_leave: true,
        }
    }
}

impl ReconcilePolicy {
    /// Whether a counter that just reached `count` triggers reconciliation
    pub fn on_count(&self, count: i64) -> bool {
        self.every_n > 0 && count > 0 && (count as u64) % self.every_n == 0
    }

    /// Whether a leave crediting `minutes` triggers reconciliation
    pub fn on_leave(&self, minutes: i64) -> bool {
        self.on_voice_leave && minutes > 0
    }
}

/// What handling one event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A message or reaction was counted
    Counted {
        counter: StatCounter,
        stats: UserStats,
        indexed: bool,
        reconciled: Option<ReconcileOutcome>,
    },
    VoiceJoined(JoinOutcome),
    VoiceLeft {
        leave: LeaveOutcome,
        indexed: bool,
        reconciled: Option<ReconcileOutcome>,
    },
    VoiceMoved {
        switch: SwitchOutcome,
        indexed: bool,
        reconciled: Option<ReconcileOutcome>,
    },
    /// Only the guild membership was recorded
    MemberRecorded,
}

impl IngestOutcome {
    /// Reconciliation run by this event, if any
    pub fn reconciled(&self) -> Option<&ReconcileOutcome> {
        match self {
            Self::Counted { reconciled, .. }
            | Self::VoiceLeft { reconciled, .. }
            | Self::VoiceMoved { reconciled, .. } => reconciled.as_ref(),
            Self::VoiceJoined(_) | Self::MemberRecorded => None,
        }
    }
}

/// Ingest pipeline
pub struct IngestPipeline<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> IngestPipeline<'a> {
    /// Create a new IngestPipeline
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Handle one event. The event's own timestamp is used as "now".
    #[instrument(skip(self, event), fields(event_type = event.event_type(), guild_id = %event.guild_id(), user_id = %event.user_id()))]
    pub async fn handle(&self, event: &ActivityEvent) -> ServiceResult<IngestOutcome> {
        event.validate()?;

        let guild_id = event.guild_id();
        let user_id = event.user_id();
        let at = event.timestamp();

        self.ctx
            .stats_repo()
            .upsert_membership(guild_id, user_id, at)
            .await?;

        let outcome = match event {
            ActivityEvent::MessagePosted(_) => self.count(event, ActivityType::Messages).await?,
            ActivityEvent::ReactionAdded(_) => self.count(event, ActivityType::Reactions).await?,
            ActivityEvent::VoiceJoined(e) => IngestOutcome::VoiceJoined(
                VoiceSessionTracker::new(self.ctx)
                    .on_join(user_id, e.channel_id, guild_id, at)
                    .await?,
            ),
            ActivityEvent::VoiceLeft(e) => {
                let leave = VoiceSessionTracker::new(self.ctx)
                    .on_leave(user_id, e.channel_id, at)
                    .await?;
                let (indexed, reconciled) = self.after_leave(user_id, at, &leave).await?;
                IngestOutcome::VoiceLeft {
                    leave,
                    indexed,
                    reconciled,
                }
            }
            ActivityEvent::VoiceMoved(e) => {
                let switch = VoiceSessionTracker::new(self.ctx)
                    .on_switch(user_id, e.from_channel_id, e.to_channel_id, guild_id, at)
                    .await?;
                let (indexed, reconciled) = self.after_leave(user_id, at, &switch.left).await?;
                IngestOutcome::VoiceMoved {
                    switch,
                    indexed,
                    reconciled,
                }
            }
            ActivityEvent::MemberJoined(_) => IngestOutcome::MemberRecorded,
        };

        debug!("Event handled");
        Ok(outcome)
    }

    /// Log the event, bump its counter and index it
    async fn count(
        &self,
        event: &ActivityEvent,
        kind: ActivityType,
    ) -> ServiceResult<IngestOutcome> {
        let guild_id = event.guild_id();
        let user_id = event.user_id();
        let at = event.timestamp();

        if let Some(record) = ActivityRecord::from_event(self.ctx.generate_id(), event) {
            self.ctx.activity_log_repo().append(&record).await?;
        }

        let counter = kind.counter();
        let stats = self
            .ctx
            .stats_repo()
            .increment(user_id, counter, 1, at)
            .await?;

        let indexed = ActivityIndex::new(self.ctx)
            .record_on(at.date_naive(), guild_id, kind, user_id, 1)
            .await;

        let reconciled = if self.ctx.settings().reconcile.on_count(stats.get(counter)) {
            Some(RoleRuleEngine::new(self.ctx).reconcile(guild_id, user_id).await?)
        } else {
            None
        };

        Ok(IngestOutcome::Counted {
            counter,
            stats,
            indexed,
            reconciled,
        })
    }

    async fn after_leave(
        &self,
        user_id: Snowflake,
        at: DateTime<Utc>,
        leave: &LeaveOutcome,
    ) -> ServiceResult<(bool, Option<ReconcileOutcome>)> {
        let LeaveOutcome::Closed {
            session,
            duration_minutes,
            ..
        } = leave
        else {
            return Ok((false, None));
        };

        let indexed = ActivityIndex::new(self.ctx)
            .record_on(
                at.date_naive(),
                session.guild_id,
                ActivityType::Voice,
                user_id,
                *duration_minutes,
            )
            .await;

        let reconciled = if self.ctx.settings().reconcile.on_leave(*duration_minutes) {
            Some(
                RoleRuleEngine::new(self.ctx)
                    .reconcile(session.guild_id, user_id)
                    .await?,
            )
        } else {
            None
        };

        Ok((indexed, reconciled))
    }
}
