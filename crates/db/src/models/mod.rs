//! Row structs and DTOs, one module per table.

pub mod audit_event;
pub mod document_template;
pub mod event_template;
pub mod gateway_template;
pub mod number_template;
pub mod task_template;
pub mod unit;
pub mod workflow_graph;
pub mod workflow_history;
pub mod workflow_instance;
pub mod workflow_template;
pub mod workflow_template_category;

pub(crate) fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

pub(crate) fn empty_array() -> serde_json::Value {
    serde_json::Value::Array(Vec::new())
}
