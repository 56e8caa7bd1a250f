//! Ingest pipeline and worker stream tests
//!
//! Run with: cargo test -p integration-tests --test ingest

use std::time::Duration as StdDuration;

use chrono::Duration;
use engage_common::EngagementConfig;
use engage_core::entities::RoleRule;
use engage_core::{ActivityType, StatCounter};
use engage_service::services::activity_index::activity_key;
use engage_service::{FailureKind, IngestOutcome, IngestPipeline, JoinOutcome};
use engage_worker::{process_stream, IngestStats};
use integration_tests::{
    id, member_joined, message, minutes, ndjson, reaction, rule, t0, voice_join, voice_leave,
    voice_move, TestEngine,
};
use tokio::io::BufReader;

const GUILD: i64 = 100;
const USER: i64 = 42;

fn every(n: u64) -> TestEngine {
    TestEngine::with_config(&EngagementConfig {
        reconcile_every: n,
        ..EngagementConfig::default()
    })
}

#[tokio::test]
async fn test_message_updates_counter_index_and_membership() {
    let engine = TestEngine::new();

    let outcome = IngestPipeline::new(engine.ctx())
        .handle(&message(GUILD, USER, t0()))
        .await
        .unwrap();

    match outcome {
        IngestOutcome::Counted {
            counter,
            stats,
            indexed,
            reconciled,
        } => {
            assert_eq!(counter, StatCounter::Messages);
            assert_eq!(stats.message_count, 1);
            assert!(indexed);
            assert!(reconciled.is_none());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let key = activity_key(id(GUILD), t0().date_naive(), ActivityType::Messages);
    assert_eq!(engine.cache.score(&key, &USER.to_string()), Some(1.0));
    assert!(engine.store.is_member(id(GUILD), id(USER)));
}

#[tokio::test]
async fn test_day_bucket_follows_event_timestamp() {
    let engine = TestEngine::new();
    let yesterday = t0() - Duration::days(1);

    IngestPipeline::new(engine.ctx())
        .handle(&reaction(GUILD, USER, yesterday))
        .await
        .unwrap();

    let key = activity_key(id(GUILD), yesterday.date_naive(), ActivityType::Reactions);
    assert_eq!(engine.cache.score(&key, &USER.to_string()), Some(1.0));
}

#[tokio::test]
async fn test_messages_and_reactions_are_logged() {
    let engine = TestEngine::new();
    let pipeline = IngestPipeline::new(engine.ctx());

    pipeline.handle(&message(GUILD, USER, t0())).await.unwrap();
    pipeline
        .handle(&reaction(GUILD, USER, t0() + minutes(1)))
        .await
        .unwrap();
    pipeline.handle(&voice_join(GUILD, 5, USER, t0())).await.unwrap();
    pipeline.handle(&member_joined(GUILD, USER, t0())).await.unwrap();

    let log = engine.store.activity_log(id(USER));
    assert_eq!(log.len(), 2);

    assert_eq!(log[0].kind, ActivityType::Messages);
    assert_eq!(log[0].channel_id, Some(id(7)));
    assert_eq!(log[0].guild_id, id(GUILD));

    assert_eq!(log[1].kind, ActivityType::Reactions);
    assert_eq!(log[1].message_id, Some(id(8)));
    assert_eq!(log[1].emoji.as_deref(), Some("👍"));
    assert_eq!(log[1].occurred_at, t0() + minutes(1));
    assert_ne!(log[0].id, log[1].id);
}

#[tokio::test]
async fn test_counters_survive_ephemeral_outage() {
    let engine = TestEngine::new();
    engine.cache.set_available(false);
    let pipeline = IngestPipeline::new(engine.ctx());

    for _ in 0..3 {
        let outcome = pipeline.handle(&message(GUILD, USER, t0())).await.unwrap();
        assert!(matches!(outcome, IngestOutcome::Counted { indexed: false, .. }));
    }
    pipeline.handle(&reaction(GUILD, USER, t0())).await.unwrap();

    let stats = engine.store.stats(id(USER)).unwrap();
    assert_eq!(stats.message_count, 3);
    assert_eq!(stats.reaction_count, 1);
}

#[tokio::test]
async fn test_durable_outage_fails_the_event() {
    let engine = TestEngine::new();
    engine.store.set_available(false);

    let err = IngestPipeline::new(engine.ctx())
        .handle(&message(GUILD, USER, t0()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Durable);
}

#[tokio::test]
async fn test_reconcile_every_nth_count() {
    let engine = every(3);
    engine.store.add_rule(RoleRule {
        min_messages: Some(3),
        ..rule(1, GUILD, 900, "Talker")
    });
    let pipeline = IngestPipeline::new(engine.ctx());

    for _ in 0..2 {
        let outcome = pipeline.handle(&message(GUILD, USER, t0())).await.unwrap();
        assert!(outcome.reconciled().is_none());
    }
    let outcome = pipeline.handle(&message(GUILD, USER, t0())).await.unwrap();
    assert_eq!(outcome.reconciled().unwrap().granted, vec!["Talker".to_string()]);
}

#[tokio::test]
async fn test_zero_disables_count_trigger() {
    let engine = every(0);
    engine.store.add_rule(rule(1, GUILD, 900, "Anyone"));

    let outcome = IngestPipeline::new(engine.ctx())
        .handle(&message(GUILD, USER, t0()))
        .await
        .unwrap();
    assert!(outcome.reconciled().is_none());
    assert!(engine.store.role_ids(id(GUILD), id(USER)).is_empty());
}

#[tokio::test]
async fn test_voice_leave_indexes_minutes_and_reconciles() {
    let engine = TestEngine::new();
    engine.store.add_rule(RoleRule {
        min_voice_minutes: Some(30),
        ..rule(1, GUILD, 901, "Voice Regular")
    });
    let pipeline = IngestPipeline::new(engine.ctx());

    let joined = pipeline.handle(&voice_join(GUILD, 5, USER, t0())).await.unwrap();
    assert!(matches!(joined, IngestOutcome::VoiceJoined(JoinOutcome::Opened(_))));

    let left = pipeline
        .handle(&voice_leave(GUILD, 5, USER, t0() + minutes(45)))
        .await
        .unwrap();
    match &left {
        IngestOutcome::VoiceLeft { leave, indexed, .. } => {
            assert_eq!(leave.credited_minutes(), 45);
            assert!(*indexed);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(left.reconciled().unwrap().granted, vec!["Voice Regular".to_string()]);

    let key = activity_key(id(GUILD), t0().date_naive(), ActivityType::Voice);
    assert_eq!(engine.cache.score(&key, &USER.to_string()), Some(45.0));
}

#[tokio::test]
async fn test_voice_move_credits_the_old_channel() {
    let engine = TestEngine::new();
    let pipeline = IngestPipeline::new(engine.ctx());

    pipeline.handle(&voice_join(GUILD, 5, USER, t0())).await.unwrap();
    let moved = pipeline
        .handle(&voice_move(GUILD, 5, 6, USER, t0() + minutes(20)))
        .await
        .unwrap();

    match moved {
        IngestOutcome::VoiceMoved { switch, indexed, .. } => {
            assert_eq!(switch.left.credited_minutes(), 20);
            assert!(matches!(switch.joined, JoinOutcome::Opened(_)));
            assert!(indexed);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(engine.store.stats(id(USER)).unwrap().voice_minutes, 20);
    assert_eq!(engine.store.open_sessions(id(USER))[0].channel_id, id(6));
}

#[tokio::test]
async fn test_leave_without_minutes_skips_reconcile() {
    let engine = TestEngine::new();
    engine.store.add_rule(rule(1, GUILD, 901, "Anyone"));
    let pipeline = IngestPipeline::new(engine.ctx());

    pipeline.handle(&voice_join(GUILD, 5, USER, t0())).await.unwrap();
    let left = pipeline
        .handle(&voice_leave(GUILD, 5, USER, t0() + Duration::seconds(30)))
        .await
        .unwrap();
    assert!(left.reconciled().is_none());
}

#[tokio::test]
async fn test_member_joined_only_records_membership() {
    let engine = TestEngine::new();

    let outcome = IngestPipeline::new(engine.ctx())
        .handle(&member_joined(GUILD, USER, t0()))
        .await
        .unwrap();

    assert_eq!(outcome, IngestOutcome::MemberRecorded);
    assert!(engine.store.is_member(id(GUILD), id(USER)));
    assert!(engine.store.stats(id(USER)).is_none());
}

#[tokio::test]
async fn test_invalid_event_is_rejected_before_any_write() {
    let engine = TestEngine::new();

    let err = IngestPipeline::new(engine.ctx())
        .handle(&voice_move(GUILD, 5, 5, USER, t0()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Validation);
    assert!(!engine.store.is_member(id(GUILD), id(USER)));
}

// ============================================================================
// Worker stream
// ============================================================================

#[tokio::test]
async fn test_process_stream_counts_outcomes() {
    let engine = TestEngine::new();
    let mut input = ndjson(&[
        message(GUILD, 1, t0()),
        reaction(GUILD, 2, t0()),
        voice_join(GUILD, 5, 3, t0()),
    ])
    .unwrap();
    input.push_str("{\"type\":\"MESSAGE_POSTED\"}\n\n   \nnot json\n");

    let stats = process_stream(
        engine.ctx.clone(),
        BufReader::new(input.as_bytes()),
        4,
        std::future::pending::<()>(),
    )
    .await
    .unwrap();

    assert_eq!(
        stats,
        IngestStats {
            received: 5,
            handled: 3,
            rejected: 2,
            failed: 0,
        }
    );
    assert_eq!(engine.store.stats(id(1)).unwrap().message_count, 1);
    assert_eq!(engine.store.open_sessions(id(3)).len(), 1);
}

#[tokio::test]
async fn test_process_stream_drops_events_on_durable_failure() {
    let engine = TestEngine::new();
    engine.store.set_available(false);
    let input = ndjson(&[message(GUILD, 1, t0()), message(GUILD, 2, t0())]).unwrap();

    let stats = process_stream(
        engine.ctx.clone(),
        BufReader::new(input.as_bytes()),
        1,
        std::future::pending::<()>(),
    )
    .await
    .unwrap();

    assert_eq!(stats.received, 2);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.handled, 0);
}

#[tokio::test]
async fn test_process_stream_stops_on_shutdown() {
    let engine = TestEngine::new();
    let input = ndjson(&[message(GUILD, 1, t0())]).unwrap();

    let stats = process_stream(
        engine.ctx.clone(),
        BufReader::new(input.as_bytes()),
        1,
        std::future::ready(()),
    )
    .await
    .unwrap();

    assert_eq!(stats, IngestStats::default());
    assert!(engine.store.stats(id(1)).is_none());
}

#[tokio::test]
async fn test_process_stream_keeps_join_before_leave() {
    let engine = TestEngine::new();
    engine.store.delay_next_membership(StdDuration::from_millis(50));
    let input = ndjson(&[
        voice_join(GUILD, 5, USER, t0()),
        voice_leave(GUILD, 5, USER, t0() + minutes(30)),
    ])
    .unwrap();

    let stats = process_stream(
        engine.ctx.clone(),
        BufReader::new(input.as_bytes()),
        8,
        std::future::pending::<()>(),
    )
    .await
    .unwrap();

    assert_eq!(stats.handled, 2);
    assert!(engine.store.open_sessions(id(USER)).is_empty());
    assert_eq!(engine.store.stats(id(USER)).unwrap().voice_minutes, 30);
}

#[tokio::test]
async fn test_process_stream_serializes_per_user_voice() {
    let engine = TestEngine::new();
    let input = ndjson(&[
        voice_join(GUILD, 5, USER, t0()),
        voice_join(GUILD, 5, USER, t0() + minutes(1)),
        voice_join(GUILD, 5, USER, t0() + minutes(2)),
    ])
    .unwrap();

    let stats = process_stream(
        engine.ctx.clone(),
        BufReader::new(input.as_bytes()),
        8,
        std::future::pending::<()>(),
    )
    .await
    .unwrap();

    assert_eq!(stats.handled, 3);
    assert_eq!(engine.store.open_sessions(id(USER)).len(), 1);
}
