//! Graph resolution and version history against a live database.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use sqlx::PgPool;
use procflow_core::error::CoreError;
use procflow_core::versioning::BumpType;
use procflow_db::models::workflow_history::CreateWorkflowHistory;
use procflow_db::repositories::{WorkflowHistoryRepo, WorkflowTemplateRepo};
use procflow_engine::{EngineConfig, EngineError, SaveVersionRequest};

use common::{actor, seed_graph, services, services_with, workflow_template};

// -- resolution ----------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn resolution_is_idempotent(pool: PgPool) {
    seed_graph(&pool, 12).await;
    let s = services(&pool);

    let first = s.resolver.resolve(12).await.unwrap().to_portable();
    let second = s.resolver.resolve(12).await.unwrap().to_portable();

    assert_eq!(first, second);
    assert_eq!(first.task_templates.len(), 1);
    assert_eq!(first.document_templates[0].id, 12002);
    assert_eq!(first.gateway_templates[0].id, 12003);
    assert_eq!(first.event_templates[0].id, 12004);
    assert!(first.workflow_template.errors_subscribers.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_references_are_skipped(pool: PgPool) {
    let xml = common::bpmn(&["task-30001", "gateway-30009", "event-0", "EndEvent_1"]);
    WorkflowTemplateRepo::create(&pool, &workflow_template(30, xml))
        .await
        .unwrap();
    let s = services(&pool);

    let graph = s.resolver.resolve(30).await.unwrap();
    assert!(graph.task_templates.is_empty());
    assert!(graph.gateway_templates.is_empty());
    assert!(graph.event_templates.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_template_and_bad_xml_are_distinct_errors(pool: PgPool) {
    WorkflowTemplateRepo::create(&pool, &workflow_template(31, "<definitions>".to_string()))
        .await
        .unwrap();
    let s = services(&pool);

    assert_matches!(
        s.resolver.resolve(99).await,
        Err(EngineError::Core(CoreError::NotFound { .. }))
    );
    assert_matches!(
        s.resolver.resolve(31).await,
        Err(EngineError::Core(CoreError::InvalidXml(_)))
    );
}

// -- explicit versions -----------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn saved_versions_increase_and_one_stays_current(pool: PgPool) {
    seed_graph(&pool, 12).await;
    let s = services(&pool);
    let user = actor("u1", None);

    let mut versions = Vec::new();
    for bump in [BumpType::Patch, BumpType::Minor, BumpType::Patch, BumpType::Major] {
        let request = SaveVersionRequest {
            bump_type: bump,
            ..Default::default()
        };
        let history = s.versions.save_version(12, request, &user).await.unwrap();
        versions.push(history.version.unwrap());
    }
    assert_eq!(versions, vec!["1.0.0", "1.1.0", "1.1.1", "2.0.0"]);

    let current: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM workflow_histories WHERE workflow_template_id = 12 AND is_current_version",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(current, 1);

    let current = WorkflowHistoryRepo::find_current(&pool, 12).await.unwrap().unwrap();
    assert_eq!(current.version.as_deref(), Some("2.0.0"));
    assert!(current.data["workflow_template"].get("errors_subscribers").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn legacy_integer_version_is_bumped_from_1_0_n(pool: PgPool) {
    seed_graph(&pool, 12).await;
    WorkflowHistoryRepo::create(
        &pool,
        &CreateWorkflowHistory {
            workflow_template_id: 12,
            user_id: "legacy".to_string(),
            data: serde_json::json!({}),
            version: Some("7".to_string()),
            is_current_version: true,
            meta: serde_json::json!({}),
            name: None,
            description: None,
        },
    )
    .await
    .unwrap();
    let s = services(&pool);

    let request = SaveVersionRequest {
        bump_type: BumpType::Minor,
        ..Default::default()
    };
    let history = s.versions.save_version(12, request, &actor("u1", None)).await.unwrap();
    assert_eq!(history.version.as_deref(), Some("1.1.0"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn version_lookup_returns_the_snapshot(pool: PgPool) {
    seed_graph(&pool, 12).await;
    let s = services(&pool);
    s.versions
        .save_version(12, SaveVersionRequest::default(), &actor("u1", None))
        .await
        .unwrap();

    let found = s.versions.find_version(12, "1.0.0").await.unwrap().unwrap();
    assert_eq!(found.data["workflow_template"]["id"], 12);
    assert!(s.versions.find_version(12, "9.9.9").await.unwrap().is_none());

    let listed = s.versions.list_versions(12).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_matches!(
        s.versions.list_versions(404).await,
        Err(EngineError::Core(CoreError::NotFound { .. }))
    );
}

// -- auto-save -------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn auto_save_is_debounced_per_user_and_address(pool: PgPool) {
    seed_graph(&pool, 12).await;
    let config = EngineConfig {
        auto_save_version_after: Duration::from_secs(3600),
        ..Default::default()
    };
    let s = services_with(&pool, config, [1], [7]);

    let first = s.versions.auto_save(12, &actor("u1", Some("10.0.0.1"))).await.unwrap();
    let first = first.expect("first auto-save writes a row");
    assert!(first.version.is_none());
    assert!(!first.is_current_version);

    let repeat = s.versions.auto_save(12, &actor("u1", Some("10.0.0.1"))).await.unwrap();
    assert!(repeat.is_none());

    let other_address = s.versions.auto_save(12, &actor("u1", Some("10.0.0.2"))).await.unwrap();
    assert!(other_address.is_some());

    let other_user = s.versions.auto_save(12, &actor("u2", Some("10.0.0.2"))).await.unwrap();
    assert!(other_user.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn auto_save_with_zero_delay_always_writes(pool: PgPool) {
    seed_graph(&pool, 12).await;
    let config = EngineConfig {
        auto_save_version_after: Duration::ZERO,
        ..Default::default()
    };
    let s = services_with(&pool, config, [1], [7]);
    let user = actor("u1", None);

    s.versions.auto_save(12, &user).await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(s.versions.auto_save(12, &user).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn auto_save_keeps_bare_template_when_bpmn_is_broken(pool: PgPool) {
    WorkflowTemplateRepo::create(&pool, &workflow_template(31, "<half".to_string()))
        .await
        .unwrap();
    let s = services(&pool);

    let history = s.versions.auto_save(31, &actor("u1", None)).await.unwrap().unwrap();
    assert_eq!(history.data["workflow_template"]["id"], 31);
    assert_eq!(history.data["task_templates"], serde_json::json!([]));
}

// -- stale header ----------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn stale_history_id_is_rejected(pool: PgPool) {
    seed_graph(&pool, 12).await;
    let s = services(&pool);
    let saved = s
        .versions
        .save_version(12, SaveVersionRequest::default(), &actor("u1", None))
        .await
        .unwrap();

    s.versions.ensure_fresh(12, None).await.unwrap();
    s.versions.ensure_fresh(12, Some(saved.id)).await.unwrap();
    assert_matches!(
        s.versions.ensure_fresh(12, Some(saved.id - 1)).await,
        Err(EngineError::Core(CoreError::StaleHistory { expected: Some(id), .. })) if id == saved.id
    );
}
