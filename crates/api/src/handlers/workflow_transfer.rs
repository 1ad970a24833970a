//! Export and import of whole workflow template graphs.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use procflow_core::error::CoreError;
use procflow_core::types::DbId;
use procflow_engine::ImportOptions;

use crate::error::{AppError, AppResult};
use crate::middleware::actor::RequestActor;
use crate::middleware::auth::AuthUser;
use crate::middleware::history::LastHistoryId;
use crate::response::{history_headers, DataResponse};
use crate::state::AppState;

/// Body of an import request.
///
/// `data` is the exported graph, either as JSON or as a string holding it.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub data: serde_json::Value,
    #[serde(flatten)]
    pub options: ImportOptions,
}

/// GET /api/v1/workflow-templates/{id}/export
///
/// Downloads the portable graph as a JSON attachment.
pub async fn export(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let graph = state.transfer.export(id).await?.ok_or(CoreError::NotFound {
        entity: "WorkflowTemplate",
        id,
    })?;
    let body = serde_json::to_vec_pretty(&graph)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize export: {e}")))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"workflow-template-{id}.json\""),
            ),
        ],
        body,
    ))
}

/// POST /api/v1/workflow-templates/import
pub async fn import(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    LastHistoryId(last_history_id): LastHistoryId,
    Json(body): Json<ImportRequest>,
) -> AppResult<impl IntoResponse> {
    let options = ImportOptions {
        last_history_id,
        ..body.options
    };
    let history = state.transfer.import(body.data, options, &actor).await?;
    Ok((
        StatusCode::CREATED,
        history_headers(Some(history.id)),
        Json(DataResponse { data: history }),
    ))
}
