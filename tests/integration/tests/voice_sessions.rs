//! Voice session tracker tests
//!
//! Run with: cargo test -p integration-tests --test voice_sessions

use std::collections::BTreeSet;

use chrono::Duration;
use engage_service::{JoinOutcome, LeaveOutcome, VoiceSessionTracker};
use integration_tests::{id, minutes, t0, TestEngine};
use proptest::prelude::*;

const GUILD: i64 = 100;
const USER: i64 = 42;

#[tokio::test]
async fn test_join_then_leave_credits_floored_minutes() {
    let engine = TestEngine::new();
    let tracker = VoiceSessionTracker::new(engine.ctx());

    let joined = tracker.on_join(id(USER), id(1), id(GUILD), t0()).await.unwrap();
    assert!(matches!(joined, JoinOutcome::Opened(_)));

    let left = tracker
        .on_leave(id(USER), id(1), t0() + minutes(45) + Duration::seconds(59))
        .await
        .unwrap();
    assert_eq!(left.credited_minutes(), 45);
    assert_eq!(engine.store.stats(id(USER)).unwrap().voice_minutes, 45);
    assert!(engine.store.open_sessions(id(USER)).is_empty());
}

#[tokio::test]
async fn test_leave_without_join_is_a_noop() {
    let engine = TestEngine::new();
    let tracker = VoiceSessionTracker::new(engine.ctx());

    let left = tracker.on_leave(id(USER), id(1), t0()).await.unwrap();
    assert_eq!(left, LeaveOutcome::NoOpenSession);
    assert!(engine.store.stats(id(USER)).is_none());
}

#[tokio::test]
async fn test_duplicate_join_keeps_one_open_session() {
    let engine = TestEngine::new();
    let tracker = VoiceSessionTracker::new(engine.ctx());

    tracker.on_join(id(USER), id(1), id(GUILD), t0()).await.unwrap();
    let again = tracker
        .on_join(id(USER), id(1), id(GUILD), t0() + minutes(5))
        .await
        .unwrap();

    assert_eq!(again, JoinOutcome::AlreadyOpen);
    let open = engine.store.open_sessions(id(USER));
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].joined_at, t0());
}

#[tokio::test]
async fn test_sub_minute_session_closes_without_credit() {
    let engine = TestEngine::new();
    let tracker = VoiceSessionTracker::new(engine.ctx());

    tracker.on_join(id(USER), id(1), id(GUILD), t0()).await.unwrap();
    let left = tracker
        .on_leave(id(USER), id(1), t0() + Duration::seconds(59))
        .await
        .unwrap();

    match left {
        LeaveOutcome::Closed {
            duration_minutes,
            stats,
            ..
        } => {
            assert_eq!(duration_minutes, 0);
            assert!(stats.is_none());
        }
        LeaveOutcome::NoOpenSession => panic!("session should have closed"),
    }
    assert!(engine.store.open_sessions(id(USER)).is_empty());
}

#[tokio::test]
async fn test_leave_stamped_before_join_counts_zero() {
    let engine = TestEngine::new();
    let tracker = VoiceSessionTracker::new(engine.ctx());

    tracker.on_join(id(USER), id(1), id(GUILD), t0()).await.unwrap();
    let left = tracker
        .on_leave(id(USER), id(1), t0() - minutes(3))
        .await
        .unwrap();
    assert_eq!(left.credited_minutes(), 0);
}

#[tokio::test]
async fn test_switch_closes_old_and_opens_new() {
    let engine = TestEngine::new();
    let tracker = VoiceSessionTracker::new(engine.ctx());

    tracker.on_join(id(USER), id(1), id(GUILD), t0()).await.unwrap();
    let switch = tracker
        .on_switch(id(USER), id(1), id(2), id(GUILD), t0() + minutes(10))
        .await
        .unwrap();

    assert_eq!(switch.left.credited_minutes(), 10);
    assert!(matches!(switch.joined, JoinOutcome::Opened(ref s) if s.channel_id == id(2)));

    let open = engine.store.open_sessions(id(USER));
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].channel_id, id(2));
    assert_eq!(open[0].joined_at, t0() + minutes(10));
}

#[tokio::test]
async fn test_switch_from_unknown_channel_still_opens_target() {
    let engine = TestEngine::new();
    let tracker = VoiceSessionTracker::new(engine.ctx());

    let switch = tracker
        .on_switch(id(USER), id(1), id(2), id(GUILD), t0())
        .await
        .unwrap();

    assert_eq!(switch.left, LeaveOutcome::NoOpenSession);
    assert!(matches!(switch.joined, JoinOutcome::Opened(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_leaves_credit_once() {
    let engine = TestEngine::new();
    VoiceSessionTracker::new(engine.ctx())
        .on_join(id(USER), id(1), id(GUILD), t0())
        .await
        .unwrap();

    // Half the leaves go through a second engine with its own lock table
    let sibling = engine.sibling();
    let mut handles = Vec::new();
    for i in 0..16 {
        let ctx = if i % 2 == 0 {
            engine.ctx.clone()
        } else {
            sibling.ctx.clone()
        };
        handles.push(tokio::spawn(async move {
            VoiceSessionTracker::new(&ctx)
                .on_leave(id(USER), id(1), t0() + minutes(30))
                .await
                .unwrap()
        }));
    }

    let outcomes = futures::future::join_all(handles).await;
    let closed = outcomes
        .into_iter()
        .map(Result::unwrap)
        .filter(|o| matches!(o, LeaveOutcome::Closed { .. }))
        .count();

    assert_eq!(closed, 1);
    assert_eq!(engine.store.stats(id(USER)).unwrap().voice_minutes, 30);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_open_one_session() {
    let engine = TestEngine::new();
    let sibling = engine.sibling();

    let mut handles = Vec::new();
    for i in 0..16 {
        let ctx = if i % 2 == 0 {
            engine.ctx.clone()
        } else {
            sibling.ctx.clone()
        };
        handles.push(tokio::spawn(async move {
            VoiceSessionTracker::new(&ctx)
                .on_join(id(USER), id(1), id(GUILD), t0())
                .await
                .unwrap()
        }));
    }

    let opened = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .filter(|o| matches!(o, JoinOutcome::Opened(_)))
        .count();

    assert_eq!(opened, 1);
    assert_eq!(engine.store.open_sessions(id(USER)).len(), 1);
}

#[tokio::test]
async fn test_lock_table_is_pruned_after_use() {
    let engine = TestEngine::new();
    let tracker = VoiceSessionTracker::new(engine.ctx());

    tracker.on_join(id(USER), id(1), id(GUILD), t0()).await.unwrap();
    tracker.on_leave(id(USER), id(1), t0() + minutes(1)).await.unwrap();

    assert!(engine.ctx.voice_locks().is_empty());
}

// ============================================================================
// Property: credited minutes always equal the closed sessions' durations
// ============================================================================

#[derive(Debug, Clone)]
enum VoiceOp {
    Join(i64),
    Leave(i64),
    Switch(i64, i64),
}

fn voice_op() -> impl Strategy<Value = (VoiceOp, i64)> {
    let op = prop_oneof![
        (1..=3i64).prop_map(VoiceOp::Join),
        (1..=3i64).prop_map(VoiceOp::Leave),
        (1..=3i64, 1..=2i64).prop_map(|(from, step)| VoiceOp::Switch(from, (from - 1 + step) % 3 + 1)),
    ];
    (op, 0..600i64)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_voice_minutes_match_closed_sessions(ops in prop::collection::vec(voice_op(), 1..40)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let engine = TestEngine::new();
            let tracker = VoiceSessionTracker::new(engine.ctx());
            let mut expected_open: BTreeSet<i64> = BTreeSet::new();
            let mut now = t0();

            for (op, gap_seconds) in ops {
                now += Duration::seconds(gap_seconds);
                match op {
                    VoiceOp::Join(channel) => {
                        tracker.on_join(id(USER), id(channel), id(GUILD), now).await.unwrap();
                        expected_open.insert(channel);
                    }
                    VoiceOp::Leave(channel) => {
                        tracker.on_leave(id(USER), id(channel), now).await.unwrap();
                        expected_open.remove(&channel);
                    }
                    VoiceOp::Switch(from, to) => {
                        tracker
                            .on_switch(id(USER), id(from), id(to), id(GUILD), now)
                            .await
                            .unwrap();
                        expected_open.remove(&from);
                        expected_open.insert(to);
                    }
                }

                let open: Vec<i64> = engine
                    .store
                    .open_sessions(id(USER))
                    .iter()
                    .map(|s| s.channel_id.into_inner())
                    .collect();
                let distinct: BTreeSet<i64> = open.iter().copied().collect();
                prop_assert_eq!(open.len(), distinct.len());
                prop_assert_eq!(&distinct, &expected_open);
            }

            let sessions = engine.store.sessions(id(USER));
            let mut closed_total = 0;
            for session in sessions.iter().filter(|s| !s.is_open()) {
                let left_at = session.left_at.unwrap();
                let duration = session.duration_minutes.unwrap();
                prop_assert_eq!(duration, (left_at - session.joined_at).num_minutes().max(0));
                closed_total += duration;
            }

            let credited = engine.store.stats(id(USER)).map_or(0, |s| s.voice_minutes);
            prop_assert_eq!(credited, closed_total);
            Ok(())
        })?;
    }
}
