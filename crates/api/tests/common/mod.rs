//! Shared fixtures for API integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use procflow_api::auth::jwt::JwtConfig;
use procflow_api::config::ServerConfig;
use procflow_api::router::build_app_router;
use procflow_api::state::AppState;
use procflow_core::types::DbId;
use procflow_db::models::document_template::CreateDocumentTemplate;
use procflow_db::models::task_template::CreateTaskTemplate;
use procflow_db::models::workflow_template::CreateWorkflowTemplate;
use procflow_db::repositories::{DocumentTemplateRepo, TaskTemplateRepo, WorkflowTemplateRepo};
use procflow_engine::{EngineConfig, EngineError, RegisterKeyDirectory, UnitDirectory};
use procflow_events::EventBus;

// ---------------------------------------------------------------------------
// App
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

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        engine: EngineConfig::default(),
    }
}

/// Build the full application router against `pool`.
///
/// Register keys 1 to 3 and units 7 and 8 exist.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState::new(
        pool,
        config.clone(),
        Arc::new(EventBus::default()),
        Arc::new(FixedKeys([1, 2, 3].into_iter().collect())),
        Arc::new(FixedUnits([7, 8].into_iter().collect())),
    );
    build_app_router(state, &config)
}

/// A valid bearer token for `user_id`.
pub fn token(user_id: &str) -> String {
    test_config().jwt.issue(user_id).unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Send one request through the router.
///
/// `headers` are added verbatim after the bearer token.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    user_id: Option<&str>,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header("authorization", format!("Bearer {}", token(user_id)));
    }
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

/// Unauthenticated GET.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, &[], None).await
}

pub async fn get_auth(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some("u1"), &[], None).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some("u1"), &[], Some(body)).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `Last-Workflow-History-Id` response header as an integer.
pub fn history_header(response: &Response<Body>) -> Option<DbId> {
    response
        .headers()
        .get("last-workflow-history-id")
        .map(|v| v.to_str().unwrap().parse().unwrap())
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

pub fn bpmn(nodes: &[&str]) -> String {
    let flows: String = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| format!(r#"<bpmn:sequenceFlow id="Flow_{i}" targetRef="{node}" />"#))
        .collect();
    format!(
        r#"<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL"><bpmn:process id="Process_1">{flows}</bpmn:process></bpmn:definitions>"#
    )
}

pub fn create_body(id: DbId) -> Value {
    json!({
        "id": id,
        "name": format!("Template {id}"),
        "xml_bpmn_schema": bpmn(&[]),
    })
}

/// Template `id` with task `id001`, which is attached to document `id002`.
pub async fn seed_graph(pool: &PgPool, id: DbId) {
    let task = id * 1000 + 1;
    let document = id * 1000 + 2;

    WorkflowTemplateRepo::create(
        pool,
        &CreateWorkflowTemplate {
            id,
            name: format!("Template {id}"),
            description: None,
            xml_bpmn_schema: bpmn(&[&format!("task-{task}")]),
            data: json!({"startTaskTemplateId": task}),
            is_active: true,
            workflow_template_category_id: None,
            access_units: json!([]),
            errors_subscribers: Vec::new(),
        },
    )
    .await
    .unwrap();

    DocumentTemplateRepo::create(
        pool,
        &CreateDocumentTemplate {
            id: document,
            name: "Form".to_string(),
            description: None,
            json_schema: json!({"properties": {"amount": {"keyId": 1}}}),
            json_schema_raw: None,
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
            json_schema: json!({"setPermissions": [{"performerUnits": [7]}]}),
            json_schema_raw: None,
            html_template: None,
        },
    )
    .await
    .unwrap();
}
