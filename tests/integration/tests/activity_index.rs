//! Windowed activity index tests
//!
//! Run with: cargo test -p integration-tests --test activity_index

use std::time::Duration as StdDuration;

use chrono::{Days, NaiveDate};
use engage_core::entities::LeaderboardEntry;
use engage_core::ActivityType;
use engage_service::services::activity_index::activity_key;
use engage_service::{ActivityIndex, EngineSettings, IndexQuery};
use integration_tests::{id, t0, TestEngine};

const GUILD: i64 = 100;

fn today() -> NaiveDate {
    t0().date_naive()
}

fn days_ago(n: u64) -> NaiveDate {
    today().checked_sub_days(Days::new(n)).unwrap_or(today())
}

fn entries(query: &IndexQuery) -> Vec<(i64, i64)> {
    query
        .entries()
        .unwrap_or_default()
        .iter()
        .map(|e: &LeaderboardEntry| (e.user_id.into_inner(), e.score))
        .collect()
}

#[tokio::test]
async fn test_two_day_window_merges_scores() {
    let engine = TestEngine::new();
    let index = ActivityIndex::new(engine.ctx());
    let kind = ActivityType::Messages;
    let (a, b, c) = (1, 2, 3);

    index.record_on(days_ago(1), id(GUILD), kind, id(a), 5).await;
    index.record_on(days_ago(1), id(GUILD), kind, id(b), 2).await;
    index.record_on(today(), id(GUILD), kind, id(a), 1).await;
    index.record_on(today(), id(GUILD), kind, id(c), 4).await;

    let top = index.top_k_at(today(), id(GUILD), kind, 2, 3).await;
    assert_eq!(entries(&top), vec![(a, 6), (c, 4), (b, 2)]);
}

#[tokio::test]
async fn test_window_sums_daily_buckets() {
    let engine = TestEngine::new();
    let index = ActivityIndex::new(engine.ctx());
    let kind = ActivityType::Messages;

    for (day, user, amount) in [
        (today(), 1, 3),
        (days_ago(6), 1, 3),
        (days_ago(2), 3, 4),
        (days_ago(1), 2, 2),
        // One day outside a 7-day window
        (days_ago(7), 2, 10),
    ] {
        assert!(index.record_on(day, id(GUILD), kind, id(user), amount).await);
    }

    let top = index.top_k_at(today(), id(GUILD), kind, 7, 3).await;
    assert_eq!(entries(&top), vec![(1, 6), (3, 4), (2, 2)]);

    // A wider window picks up the older bucket
    let top = index.top_k_at(today(), id(GUILD), kind, 8, 3).await;
    assert_eq!(entries(&top), vec![(2, 12), (1, 6), (3, 4)]);
}

#[tokio::test]
async fn test_ties_break_by_user_id_before_truncation() {
    let engine = TestEngine::new();
    let index = ActivityIndex::new(engine.ctx());
    let kind = ActivityType::Reactions;

    for user in [30, 10, 20] {
        index.record_on(today(), id(GUILD), kind, id(user), 5).await;
    }

    let top = index.top_k_at(today(), id(GUILD), kind, 1, 2).await;
    assert_eq!(entries(&top), vec![(10, 5), (20, 5)]);
}

#[tokio::test]
async fn test_buckets_are_per_guild_and_kind() {
    let engine = TestEngine::new();
    let index = ActivityIndex::new(engine.ctx());

    index.record_on(today(), id(GUILD), ActivityType::Voice, id(1), 30).await;
    index.record_on(today(), id(200), ActivityType::Voice, id(2), 90).await;
    index.record_on(today(), id(GUILD), ActivityType::Messages, id(3), 1).await;

    let top = index.top_k_at(today(), id(GUILD), ActivityType::Voice, 7, 10).await;
    assert_eq!(entries(&top), vec![(1, 30)]);
}

#[tokio::test]
async fn test_non_positive_amounts_are_not_recorded() {
    let engine = TestEngine::new();
    let index = ActivityIndex::new(engine.ctx());

    assert!(!index.record_on(today(), id(GUILD), ActivityType::Voice, id(1), 0).await);
    let key = activity_key(id(GUILD), today(), ActivityType::Voice);
    assert!(!engine.cache.contains(&key));
}

#[tokio::test]
async fn test_buckets_expire_after_retention() {
    let engine = TestEngine::new();
    let index = ActivityIndex::new(engine.ctx());
    let kind = ActivityType::Messages;
    let key = activity_key(id(GUILD), today(), kind);

    index.record_on(today(), id(GUILD), kind, id(1), 1).await;
    assert_eq!(engine.cache.ttl(&key), Some(30 * 24 * 60 * 60));
    assert_eq!(engine.cache.score(&key, "1"), Some(1.0));

    engine.cache.advance(30 * 24 * 60 * 60);
    assert!(!engine.cache.contains(&key));
}

#[tokio::test]
async fn test_window_and_k_are_clamped() {
    let engine = TestEngine::new();
    let index = ActivityIndex::new(engine.ctx());
    let kind = ActivityType::Messages;

    index.record_on(today(), id(GUILD), kind, id(1), 2).await;
    index.record_on(days_ago(1), id(GUILD), kind, id(2), 9).await;

    // Zero-day window means today only; zero k means one row
    let top = index.top_k_at(today(), id(GUILD), kind, 0, 0).await;
    assert_eq!(entries(&top), vec![(1, 2)]);
}

#[tokio::test]
async fn test_empty_window_is_ranked_not_unavailable() {
    let engine = TestEngine::new();
    let top = ActivityIndex::new(engine.ctx())
        .top_k_at(today(), id(GUILD), ActivityType::Voice, 7, 10)
        .await;
    assert_eq!(top, IndexQuery::Ranked(vec![]));
}

#[tokio::test]
async fn test_unreachable_store_reports_unavailable() {
    let engine = TestEngine::new();
    engine.cache.set_available(false);
    let index = ActivityIndex::new(engine.ctx());

    assert!(!index.record_on(today(), id(GUILD), ActivityType::Messages, id(1), 1).await);
    assert!(index
        .top_k_at(today(), id(GUILD), ActivityType::Messages, 7, 10)
        .await
        .is_unavailable());
}

#[tokio::test]
async fn test_slow_store_times_out_as_unavailable() {
    let engine = TestEngine::with_settings(EngineSettings {
        cache_timeout: StdDuration::from_millis(20),
        ..EngineSettings::default()
    });
    engine.cache.set_latency(Some(StdDuration::from_millis(500)));

    let top = ActivityIndex::new(engine.ctx())
        .top_k_at(today(), id(GUILD), ActivityType::Messages, 7, 10)
        .await;
    assert!(top.is_unavailable());
}
