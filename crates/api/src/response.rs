//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Mutations that write a
//! history row also report its id in the `Last-Workflow-History-Id` header so
//! the editor can send it back with its next mutation.

use axum::http::{HeaderMap, HeaderValue};
use serde::Serialize;
use procflow_core::types::DbId;

/// Header carrying the id of the latest history row of a template.
pub const LAST_HISTORY_ID_HEADER: &str = "last-workflow-history-id";

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Response headers announcing the latest history row, empty when there is none.
pub fn history_headers(last_history_id: Option<DbId>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(id) = last_history_id {
        headers.insert(LAST_HISTORY_ID_HEADER, HeaderValue::from(id));
    }
    headers
}
