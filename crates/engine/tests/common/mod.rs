//! Shared fixtures for engine integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use procflow_core::types::DbId;
use procflow_db::models::document_template::CreateDocumentTemplate;
use procflow_db::models::event_template::CreateEventTemplate;
use procflow_db::models::gateway_template::CreateGatewayTemplate;
use procflow_db::models::task_template::CreateTaskTemplate;
use procflow_db::models::workflow_template::{CreateWorkflowTemplate, ErrorSubscriber};
use procflow_db::repositories::{
    DocumentTemplateRepo, EventTemplateRepo, GatewayTemplateRepo, TaskTemplateRepo,
    WorkflowTemplateRepo,
};
use procflow_engine::{
    Actor, CopyService, EngineConfig, EngineError, GraphResolver, RegisterKeyDirectory,
    RequestMeta, StagedCopyStore, TransferService, UnitDirectory, VersionManager,
    WorkflowTemplateService,
};
use procflow_events::EventBus;

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

pub struct FixedKeys(pub HashSet<DbId>);

#[async_trait]
impl RegisterKeyDirectory for FixedKeys {
    async fn available_key_ids(&self) -> Result<HashSet<DbId>, EngineError> {
        Ok(self.0.clone())
    }
}

pub struct FixedUnits(pub HashSet<DbId>);

#[async_trait]
impl UnitDirectory for FixedUnits {
    async fn unit_exists(&self, unit_id: DbId) -> Result<bool, EngineError> {
        Ok(self.0.contains(&unit_id))
    }
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

pub struct Services {
    pub resolver: GraphResolver,
    pub versions: Arc<VersionManager>,
    pub templates: WorkflowTemplateService,
    pub transfer: TransferService,
    pub copy: CopyService,
    pub store: Arc<StagedCopyStore>,
}

pub fn services(pool: &PgPool) -> Services {
    services_with(pool, EngineConfig::default(), [1, 2, 3], [7, 8])
}

pub fn services_with(
    pool: &PgPool,
    config: EngineConfig,
    keys: impl IntoIterator<Item = DbId>,
    units: impl IntoIterator<Item = DbId>,
) -> Services {
    let bus = Arc::new(EventBus::default());
    let resolver = GraphResolver::new(pool.clone());
    let versions = Arc::new(VersionManager::new(
        pool.clone(),
        resolver.clone(),
        Arc::clone(&bus),
        &config,
    ));
    let store = Arc::new(StagedCopyStore::new());

    Services {
        templates: WorkflowTemplateService::new(
            pool.clone(),
            resolver.clone(),
            Arc::clone(&versions),
            Arc::clone(&bus),
            &config,
        ),
        transfer: TransferService::new(
            pool.clone(),
            resolver.clone(),
            Arc::clone(&versions),
            Arc::new(FixedKeys(keys.into_iter().collect())),
            Arc::new(FixedUnits(units.into_iter().collect())),
            Arc::clone(&bus),
        ),
        copy: CopyService::new(
            pool.clone(),
            resolver.clone(),
            Arc::clone(&store),
            Arc::clone(&bus),
            &config,
        ),
        resolver,
        versions,
        store,
    }
}

pub fn actor(user_id: &str, forwarded_for: Option<&str>) -> Actor {
    Actor::new(
        user_id,
        RequestMeta {
            x_forwarded_for: forwarded_for.map(str::to_string),
            user_agent: Some("tests".to_string()),
            ip: None,
        },
    )
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

/// A legacy `bpmn2:` document chaining the given node ids with sequence flows.
pub fn bpmn(nodes: &[&str]) -> String {
    let mut flows = String::new();
    let mut previous = "StartEvent_1";
    for (i, node) in nodes.iter().enumerate() {
        flows.push_str(&format!(
            r#"<bpmn2:sequenceFlow id="Flow_{i}" sourceRef="{previous}" targetRef="{node}" />"#
        ));
        previous = node;
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn2:definitions xmlns:bpmn2="http://www.omg.org/spec/BPMN/20100524/MODEL">
  <bpmn2:process id="Process_1">{}</bpmn2:process>
</bpmn2:definitions>"#,
        flows
    )
}

pub fn workflow_template(id: DbId, xml: String) -> CreateWorkflowTemplate {
    CreateWorkflowTemplate {
        id,
        name: format!("Template {id}"),
        description: Some("Seeded".to_string()),
        xml_bpmn_schema: xml,
        data: json!({"startTaskTemplateId": id * 1000 + 1}),
        is_active: true,
        workflow_template_category_id: None,
        access_units: json!([]),
        errors_subscribers: vec![ErrorSubscriber {
            id: 1,
            email: "ops@example.com".to_string(),
        }],
    }
}

/// Template `id` with task `id001` (document `id002`), gateway `id003` and
/// event `id004`.
pub async fn seed_graph(pool: &PgPool, id: DbId) {
    let task = id * 1000 + 1;
    let document = id * 1000 + 2;
    let gateway = id * 1000 + 3;
    let event = id * 1000 + 4;

    let xml = bpmn(&[
        &format!("task-{task}"),
        &format!("gateway-{gateway}"),
        &format!("event-{event}"),
    ]);
    WorkflowTemplateRepo::create(pool, &workflow_template(id, xml))
        .await
        .unwrap();

    DocumentTemplateRepo::create(
        pool,
        &CreateDocumentTemplate {
            id: document,
            name: "Form".to_string(),
            description: None,
            json_schema: json!({
                "properties": {"amount": {"keyId": 1}},
                "label": format!("Attached to task {task}")
            }),
            json_schema_raw: Some("raw".to_string()),
            html_template: None,
        },
    )
    .await
    .unwrap();

    TaskTemplateRepo::create(
        pool,
        &CreateTaskTemplate {
            id: task,
            name: "Review".to_string(),
            document_template_id: document,
            json_schema: json!({
                "setPermissions": [{"performerUnits": [7]}],
                "documentTemplateId": document
            }),
            json_schema_raw: None,
            html_template: None,
        },
    )
    .await
    .unwrap();

    GatewayTemplateRepo::create(
        pool,
        &CreateGatewayTemplate {
            id: gateway,
            name: "Approved?".to_string(),
            description: None,
            gateway_type_id: Some(1),
            json_schema: json!({"rule": format!("taskTemplateId == {task}")}),
            json_schema_raw: None,
        },
    )
    .await
    .unwrap();

    EventTemplateRepo::create(
        pool,
        &CreateEventTemplate {
            id: event,
            name: "Notify".to_string(),
            description: None,
            event_type_id: Some(2),
            json_schema: json!({"keyId": 2}),
            json_schema_raw: None,
            html_template: None,
        },
    )
    .await
    .unwrap();
}
