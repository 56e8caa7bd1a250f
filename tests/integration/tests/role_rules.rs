//! Role rule engine tests
//!
//! Run with: cargo test -p integration-tests --test role_rules

use chrono::Utc;
use engage_core::entities::{RoleAssignment, RoleRule, UserStats};
use engage_service::{
    EngineSettings, FailureKind, IngestPipeline, ReconcilePolicy, RoleRuleEngine,
};
use integration_tests::{id, message, rule, t0, TestEngine};

const GUILD: i64 = 100;
const USER: i64 = 42;
const REGULAR_ROLE: i64 = 900;

fn regular() -> RoleRule {
    RoleRule {
        min_messages: Some(10),
        ..rule(1, GUILD, REGULAR_ROLE, "Regular")
    }
}

fn stats_with_messages(messages: i64) -> UserStats {
    UserStats {
        message_count: messages,
        ..UserStats::empty(id(USER), t0())
    }
}

#[tokio::test]
async fn test_threshold_crossing_grants_then_drop_revokes() {
    let engine = TestEngine::with_settings(EngineSettings {
        reconcile: ReconcilePolicy {
            every_n: 1,
            on_voice_leave: true,
        },
        ..EngineSettings::default()
    });
    engine.store.add_rule(regular());
    let pipeline = IngestPipeline::new(engine.ctx());

    for _ in 0..9 {
        let outcome = pipeline.handle(&message(GUILD, USER, t0())).await.unwrap();
        assert!(outcome.reconciled().unwrap().is_noop());
    }
    assert!(engine.store.role_ids(id(GUILD), id(USER)).is_empty());

    let outcome = pipeline.handle(&message(GUILD, USER, t0())).await.unwrap();
    assert_eq!(outcome.reconciled().unwrap().granted, vec!["Regular".to_string()]);
    assert_eq!(engine.store.role_ids(id(GUILD), id(USER)), vec![id(REGULAR_ROLE)]);

    // Counters corrected downwards out of band
    engine.store.set_stats(stats_with_messages(9));
    let outcome = RoleRuleEngine::new(engine.ctx())
        .reconcile(id(GUILD), id(USER))
        .await
        .unwrap();
    assert_eq!(outcome.revoked, vec![id(REGULAR_ROLE)]);
    assert!(engine.store.role_ids(id(GUILD), id(USER)).is_empty());
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let engine = TestEngine::new();
    engine.store.add_rule(regular());
    engine.store.set_stats(stats_with_messages(25));
    let reconciler = RoleRuleEngine::new(engine.ctx());

    let first = reconciler.reconcile(id(GUILD), id(USER)).await.unwrap();
    assert_eq!(first.granted.len(), 1);

    let second = reconciler.reconcile(id(GUILD), id(USER)).await.unwrap();
    assert!(second.is_noop());
    assert_eq!(engine.store.assignments(id(GUILD), id(USER)).len(), 1);
}

#[tokio::test]
async fn test_grant_reason_names_the_rule() {
    let engine = TestEngine::new();
    engine.store.add_rule(regular());
    engine.store.set_stats(stats_with_messages(10));

    RoleRuleEngine::new(engine.ctx())
        .reconcile(id(GUILD), id(USER))
        .await
        .unwrap();

    let assignments = engine.store.assignments(id(GUILD), id(USER));
    assert_eq!(assignments[0].reason, "Automatically granted by rule: Regular");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reconciles_grant_once() {
    let engine = TestEngine::new();
    engine.store.add_rule(regular());
    engine.store.set_stats(stats_with_messages(50));
    let sibling = engine.sibling();

    let mut handles = Vec::new();
    for i in 0..16 {
        let ctx = if i % 2 == 0 {
            engine.ctx.clone()
        } else {
            sibling.ctx.clone()
        };
        handles.push(tokio::spawn(async move {
            RoleRuleEngine::new(&ctx)
                .reconcile(id(GUILD), id(USER))
                .await
                .unwrap()
        }));
    }

    let granted: usize = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap().granted.len())
        .sum();

    assert_eq!(granted, 1);
    assert_eq!(engine.store.assignments(id(GUILD), id(USER)).len(), 1);
}

#[tokio::test]
async fn test_failing_rule_does_not_block_others() {
    let engine = TestEngine::new();
    engine.store.add_rule(regular());
    engine.store.add_rule(rule(2, GUILD, 901, "Member"));
    engine.store.fail_role(id(REGULAR_ROLE));
    engine.store.set_stats(stats_with_messages(10));

    let outcome = RoleRuleEngine::new(engine.ctx())
        .reconcile(id(GUILD), id(USER))
        .await
        .unwrap();

    assert_eq!(outcome.granted, vec!["Member".to_string()]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].role_id, id(REGULAR_ROLE));
    assert_eq!(outcome.failed[0].rule, "Regular");
    assert_eq!(engine.store.role_ids(id(GUILD), id(USER)), vec![id(901)]);
}

#[tokio::test]
async fn test_unknown_user_or_no_rules_is_empty() {
    let engine = TestEngine::new();
    let reconciler = RoleRuleEngine::new(engine.ctx());

    engine.store.set_stats(stats_with_messages(99));
    assert!(reconciler.reconcile(id(GUILD), id(USER)).await.unwrap().is_noop());

    engine.store.add_rule(regular());
    assert!(reconciler.reconcile(id(GUILD), id(7)).await.unwrap().is_noop());
}

#[tokio::test]
async fn test_roles_without_enabled_rules_are_left_alone() {
    let engine = TestEngine::new();
    engine.store.add_rule(RoleRule {
        enabled: false,
        ..rule(3, GUILD, 950, "Retired")
    });
    engine.store.add_rule(regular());
    engine.store.set_stats(stats_with_messages(0));
    engine.store.seed_assignment(RoleAssignment {
        user_id: id(USER),
        role_id: id(950),
        guild_id: id(GUILD),
        reason: "Manually granted".to_string(),
        assigned_at: Utc::now(),
    });

    let outcome = RoleRuleEngine::new(engine.ctx())
        .reconcile(id(GUILD), id(USER))
        .await
        .unwrap();

    assert!(outcome.is_noop());
    assert_eq!(engine.store.role_ids(id(GUILD), id(USER)), vec![id(950)]);
}

#[tokio::test]
async fn test_any_satisfied_rule_keeps_a_shared_role() {
    let engine = TestEngine::new();
    engine.store.add_rule(RoleRule {
        min_messages: Some(1_000),
        ..rule(1, GUILD, REGULAR_ROLE, "Veteran")
    });
    engine.store.add_rule(RoleRule {
        min_messages: Some(5),
        ..rule(2, GUILD, REGULAR_ROLE, "Chatty")
    });
    engine.store.set_stats(stats_with_messages(6));
    let reconciler = RoleRuleEngine::new(engine.ctx());

    let outcome = reconciler.reconcile(id(GUILD), id(USER)).await.unwrap();
    assert_eq!(outcome.granted, vec!["Chatty".to_string()]);

    // Still held: one of the two rules is satisfied
    let outcome = reconciler.reconcile(id(GUILD), id(USER)).await.unwrap();
    assert!(outcome.revoked.is_empty());
}

#[tokio::test]
async fn test_rule_in_another_guild_does_not_apply() {
    let engine = TestEngine::new();
    engine.store.add_rule(rule(1, 555, REGULAR_ROLE, "Elsewhere"));
    engine.store.set_stats(stats_with_messages(100));

    let outcome = RoleRuleEngine::new(engine.ctx())
        .reconcile(id(GUILD), id(USER))
        .await
        .unwrap();
    assert!(outcome.is_noop());
}

#[tokio::test]
async fn test_durable_outage_is_reported() {
    let engine = TestEngine::new();
    engine.store.add_rule(regular());
    engine.store.set_available(false);

    let err = RoleRuleEngine::new(engine.ctx())
        .reconcile(id(GUILD), id(USER))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Durable);
}
