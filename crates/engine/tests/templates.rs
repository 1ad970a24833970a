//! Workflow template lifecycle against a live database.

mod common;

use assert_matches::assert_matches;
use sqlx::PgPool;
use procflow_core::error::CoreError;
use procflow_db::models::workflow_instance::CreateWorkflowInstance;
use procflow_db::models::workflow_template::UpdateWorkflowTemplate;
use procflow_db::repositories::{
    DocumentTemplateRepo, EventTemplateRepo, TaskTemplateRepo, WorkflowInstanceRepo,
    WorkflowTemplateRepo,
};
use procflow_engine::EngineError;

use common::{actor, seed_graph, services, workflow_template};

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_refuses_existing_and_out_of_range_ids(pool: PgPool) {
    let s = services(&pool);
    let user = actor("u1", None);

    s.templates
        .create(workflow_template(5, common::bpmn(&[])), &user)
        .await
        .unwrap();
    assert_matches!(
        s.templates.create(workflow_template(5, common::bpmn(&[])), &user).await,
        Err(EngineError::Core(CoreError::AlreadyCommitted { id: 5, .. }))
    );
    assert_matches!(
        s.templates.create(workflow_template(0, common::bpmn(&[])), &user).await,
        Err(EngineError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        s.templates
            .create(workflow_template(2_147_483, common::bpmn(&[])), &user)
            .await,
        Err(EngineError::Core(CoreError::Validation(_)))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_replaces_fields_and_auto_saves(pool: PgPool) {
    seed_graph(&pool, 12).await;
    let s = services(&pool);
    let current = s.templates.get(12).await.unwrap();

    let input = UpdateWorkflowTemplate {
        name: "Renamed".to_string(),
        description: None,
        xml_bpmn_schema: current.xml_bpmn_schema,
        data: serde_json::json!({}),
        is_active: false,
        workflow_template_category_id: None,
        access_units: serde_json::json!([]),
        errors_subscribers: Vec::new(),
    };
    let (updated, history) = s.templates.update(12, input, &actor("u1", None)).await.unwrap();

    assert_eq!(updated.name, "Renamed");
    assert!(!updated.is_active);
    let history = history.expect("first update auto-saves");
    assert_eq!(history.data["workflow_template"]["name"], "Renamed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_cascades_to_reachable_templates(pool: PgPool) {
    seed_graph(&pool, 12).await;
    let s = services(&pool);

    s.templates.delete(12, &actor("u1", None)).await.unwrap();

    assert!(!WorkflowTemplateRepo::exists(&pool, 12).await.unwrap());
    assert!(TaskTemplateRepo::find_by_id(&pool, 12001).await.unwrap().is_none());
    assert!(DocumentTemplateRepo::find_by_id(&pool, 12002).await.unwrap().is_none());
    assert!(EventTemplateRepo::find_by_id(&pool, 12004).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_with_malformed_xml_removes_only_the_template(pool: PgPool) {
    seed_graph(&pool, 12).await;
    sqlx::query("UPDATE workflow_templates SET xml_bpmn_schema = '<broken' WHERE id = 12")
        .execute(&pool)
        .await
        .unwrap();
    let s = services(&pool);

    s.templates.delete(12, &actor("u1", None)).await.unwrap();

    assert!(!WorkflowTemplateRepo::exists(&pool, 12).await.unwrap());
    assert!(TaskTemplateRepo::find_by_id(&pool, 12001).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_of_started_template_fails_and_keeps_dependents(pool: PgPool) {
    seed_graph(&pool, 12).await;
    WorkflowInstanceRepo::create(
        &pool,
        &CreateWorkflowInstance {
            workflow_template_id: 12,
            name: None,
        },
    )
    .await
    .unwrap();
    let s = services(&pool);

    assert_matches!(
        s.templates.delete(12, &actor("u1", None)).await,
        Err(EngineError::Core(CoreError::TemplateInUse { id: 12 }))
    );
    assert!(TaskTemplateRepo::find_by_id(&pool, 12001).await.unwrap().is_some());
}
