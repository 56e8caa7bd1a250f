//! Windowed activity index
//!
//! One ranked set per (guild, UTC day, activity type). A window query sums
//! the trailing day buckets. Buckets expire after the retention period, so
//! the index is only ever an accelerator over the durable counters.

use chrono::{Days, NaiveDate, Utc};
use engage_core::entities::LeaderboardEntry;
use engage_core::{ActivityType, Snowflake};
use tracing::{instrument, warn};

use super::context::ServiceContext;

/// Key prefix for day buckets
const ACTIVITY_PREFIX: &str = "activity:";

/// Days a bucket is kept, and therefore the longest queryable window
pub const RETENTION_DAYS: u32 = 30;

/// Bucket TTL (30 days)
const BUCKET_TTL: u64 = RETENTION_DAYS as u64 * 24 * 60 * 60;

/// TTL of the temporary union key, in case cleanup never runs
const SCRATCH_TTL: u64 = 60;

/// Largest page a top-k query returns
pub const MAX_K: usize = 100;

/// Result of a window query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexQuery {
    /// Ranked rows, possibly empty when nobody was active in the window
    Ranked(Vec<LeaderboardEntry>),
    /// The ephemeral store could not answer
    Unavailable,
}

impl IndexQuery {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    pub fn entries(&self) -> Option<&[LeaderboardEntry]> {
        match self {
            Self::Ranked(entries) => Some(entries),
            Self::Unavailable => None,
        }
    }
}

/// Day bucket key: `activity:{guild}:{YYYY-MM-DD}:{type}`
pub fn activity_key(guild_id: Snowflake, day: NaiveDate, kind: ActivityType) -> String {
    format!(
        "{ACTIVITY_PREFIX}{guild_id}:{}:{kind}",
        day.format("%Y-%m-%d")
    )
}

/// Bucket keys for the `window_days` days ending with `today`, newest first
pub fn window_keys(
    guild_id: Snowflake,
    kind: ActivityType,
    today: NaiveDate,
    window_days: u32,
) -> Vec<String> {
    (0..window_days)
        .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .map(|day| activity_key(guild_id, day, kind))
        .collect()
}

/// Clamp a requested window to the retention period
pub fn clamp_window(window_days: u32) -> u32 {
    window_days.clamp(1, RETENTION_DAYS)
}

/// Clamp a requested page size
pub fn clamp_k(k: usize) -> usize {
    k.clamp(1, MAX_K)
}

/// Windowed activity index
pub struct ActivityIndex<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ActivityIndex<'a> {
    /// Create a new ActivityIndex
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Add `amount` to the user's score in today's bucket. Best effort:
    /// returns whether the write landed.
    pub async fn record(
        &self,
        guild_id: Snowflake,
        kind: ActivityType,
        user_id: Snowflake,
        amount: i64,
    ) -> bool {
        self.record_on(Utc::now().date_naive(), guild_id, kind, user_id, amount)
            .await
    }

    /// Add `amount` to the user's score in the bucket for `day`
    #[instrument(skip(self))]
    pub async fn record_on(
        &self,
        day: NaiveDate,
        guild_id: Snowflake,
        kind: ActivityType,
        user_id: Snowflake,
        amount: i64,
    ) -> bool {
        if amount <= 0 {
            return false;
        }

        let key = activity_key(guild_id, day, kind);
        let member = user_id.to_string();
        let result = self
            .ctx
            .ephemeral(self.ctx.ephemeral_store().zincr_with_ttl(
                &key,
                &member,
                amount as f64,
                BUCKET_TTL,
            ))
            .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, key = %key, "Activity index write skipped");
                false
            }
        }
    }

    /// Top `k` users over the `window_days` days ending today
    pub async fn top_k(
        &self,
        guild_id: Snowflake,
        kind: ActivityType,
        window_days: u32,
        k: usize,
    ) -> IndexQuery {
        self.top_k_at(Utc::now().date_naive(), guild_id, kind, window_days, k)
            .await
    }

    /// Top `k` users over the `window_days` days ending with `today`.
    ///
    /// Scores descend; equal scores are ordered by user id ascending.
    #[instrument(skip(self))]
    pub async fn top_k_at(
        &self,
        today: NaiveDate,
        guild_id: Snowflake,
        kind: ActivityType,
        window_days: u32,
        k: usize,
    ) -> IndexQuery {
        let k = clamp_k(k);
        let keys = window_keys(guild_id, kind, today, clamp_window(window_days));

        let members = match self
            .ctx
            .ephemeral(self.ctx.ephemeral_store().union_top(&keys, k, SCRATCH_TTL))
            .await
        {
            Ok(members) => members,
            Err(e) => {
                warn!(error = %e, guild_id = %guild_id, kind = %kind, "Activity index unavailable");
                return IndexQuery::Unavailable;
            }
        };

        let mut entries: Vec<LeaderboardEntry> = members
            .into_iter()
            .filter_map(|m| match Snowflake::parse(&m.member) {
                Ok(user_id) => Some(LeaderboardEntry::new(user_id, m.score.round() as i64)),
                Err(_) => {
                    warn!(member = %m.member, "Skipping malformed index member");
                    None
                }
            })
            .filter(|entry| entry.score > 0)
            .collect();

        LeaderboardEntry::rank(&mut entries);
        entries.truncate(k);
        IndexQuery::Ranked(entries)
    }
}
