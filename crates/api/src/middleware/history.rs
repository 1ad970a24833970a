//! The `Last-Workflow-History-Id` request header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use procflow_core::types::DbId;

use crate::error::AppError;
use crate::response::LAST_HISTORY_ID_HEADER;

/// History id the client last saw, `None` when the header is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastHistoryId(pub Option<DbId>);

impl<S: Send + Sync> FromRequestParts<S> for LastHistoryId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(LAST_HISTORY_ID_HEADER) else {
            return Ok(LastHistoryId(None));
        };
        let id = value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<DbId>().ok())
            .ok_or_else(|| {
                AppError::BadRequest("Last-Workflow-History-Id must be an integer".to_string())
            })?;
        Ok(LastHistoryId(Some(id)))
    }
}
