//! Leaderboard query service
//!
//! Serves a short-lived cached snapshot when one exists, otherwise asks the
//! windowed index, and falls back to all-time durable counters when the
//! index cannot answer. The source of every answer is reported.

use chrono::{NaiveDate, Utc};
use engage_core::entities::LeaderboardEntry;
use engage_core::{ActivityType, Snowflake};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::activity_index::{clamp_k, clamp_window, ActivityIndex, IndexQuery};
use super::context::ServiceContext;
use super::error::ServiceResult;

/// Key prefix for cached leaderboard snapshots
const LEADERBOARD_PREFIX: &str = "leaderboard:";

/// Where a leaderboard answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardSource {
    /// Snapshot of an earlier windowed answer
    Cached,
    /// Fresh windowed ranking
    Windowed,
    /// All-time durable counters; the window was not applied
    DurableFallback,
}

/// Ranked leaderboard with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    pub source: LeaderboardSource,
}

impl Leaderboard {
    /// Whether the ranking honours the requested window
    pub fn is_windowed(&self) -> bool {
        !matches!(self.source, LeaderboardSource::DurableFallback)
    }
}

/// Snapshot key: `leaderboard:{guild}:{type}:{YYYY-MM-DD}:{days}:{k}`.
/// The day is the last day of the window, so snapshots never outlive it.
pub fn leaderboard_key(
    guild_id: Snowflake,
    today: NaiveDate,
    kind: ActivityType,
    window_days: u32,
    k: usize,
) -> String {
    format!(
        "{LEADERBOARD_PREFIX}{guild_id}:{kind}:{}:{window_days}:{k}",
        today.format("%Y-%m-%d")
    )
}

/// Leaderboard query service
pub struct LeaderboardService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> LeaderboardService<'a> {
    /// Create a new LeaderboardService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Top `k` users of `kind` over the last `window_days` days
    pub async fn top_k(
        &self,
        guild_id: Snowflake,
        kind: ActivityType,
        window_days: u32,
        k: usize,
    ) -> ServiceResult<Leaderboard> {
        self.top_k_at(Utc::now().date_naive(), guild_id, kind, window_days, k)
            .await
    }

    /// Same as [`Self::top_k`] with an explicit current day
    #[instrument(skip(self))]
    pub async fn top_k_at(
        &self,
        today: NaiveDate,
        guild_id: Snowflake,
        kind: ActivityType,
        window_days: u32,
        k: usize,
    ) -> ServiceResult<Leaderboard> {
        let window_days = clamp_window(window_days);
        let k = clamp_k(k);
        let key = leaderboard_key(guild_id, today, kind, window_days, k);

        if let Some(entries) = self.cached(&key).await {
            return Ok(Leaderboard {
                entries,
                source: LeaderboardSource::Cached,
            });
        }

        match ActivityIndex::new(self.ctx)
            .top_k_at(today, guild_id, kind, window_days, k)
            .await
        {
            IndexQuery::Ranked(entries) => {
                self.store_snapshot(&key, &entries).await;
                Ok(Leaderboard {
                    entries,
                    source: LeaderboardSource::Windowed,
                })
            }
            IndexQuery::Unavailable => {
                warn!(guild_id = %guild_id, kind = %kind, "Serving all-time leaderboard from durable store");
                let entries = self
                    .ctx
                    .stats_repo()
                    .top_by_counter(guild_id, kind.counter(), k as i64)
                    .await?;
                Ok(Leaderboard {
                    entries,
                    source: LeaderboardSource::DurableFallback,
                })
            }
        }
    }

    async fn cached(&self, key: &str) -> Option<Vec<LeaderboardEntry>> {
        let raw = match self
            .ctx
            .ephemeral(self.ctx.ephemeral_store().get_raw(key))
            .await
        {
            Ok(raw) => raw?,
            Err(e) => {
                debug!(error = %e, key, "Leaderboard snapshot lookup failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!(error = %e, key, "Discarding unreadable leaderboard snapshot");
                None
            }
        }
    }

    async fn store_snapshot(&self, key: &str, entries: &[LeaderboardEntry]) {
        let ttl = self.ctx.settings().leaderboard_cache_ttl;
        if ttl == 0 {
            return;
        }
        let Ok(raw) = serde_json::to_string(entries) else {
            return;
        };
        if let Err(e) = self
            .ctx
            .ephemeral(self.ctx.ephemeral_store().set_raw(key, &raw, ttl))
            .await
        {
            debug!(error = %e, key, "Leaderboard snapshot not stored");
        }
    }
}
