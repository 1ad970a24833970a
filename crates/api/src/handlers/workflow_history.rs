//! Handlers for the version history of a workflow template.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use procflow_core::types::DbId;
use procflow_engine::SaveVersionRequest;

use crate::error::{AppError, AppResult};
use crate::middleware::actor::RequestActor;
use crate::middleware::auth::AuthUser;
use crate::middleware::history::LastHistoryId;
use crate::response::{history_headers, DataResponse};
use crate::state::AppState;

/// GET /api/v1/workflow-templates/{id}/versions
///
/// Version-bearing rows only, newest first, without snapshots.
pub async fn list_versions(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let versions = state.versions.list_versions(id).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// POST /api/v1/workflow-templates/{id}/versions
pub async fn save_version(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    LastHistoryId(last_history_id): LastHistoryId,
    Path(id): Path<DbId>,
    Json(body): Json<SaveVersionRequest>,
) -> AppResult<impl IntoResponse> {
    state.versions.ensure_fresh(id, last_history_id).await?;
    let history = state.versions.save_version(id, body, &actor).await?;
    Ok((
        StatusCode::CREATED,
        history_headers(Some(history.id)),
        Json(DataResponse { data: history }),
    ))
}

/// GET /api/v1/workflow-templates/{id}/versions/{version}
pub async fn get_version(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((id, version)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let history = state
        .versions
        .find_version(id, &version)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Version {version} of workflow template {id} not found"))
        })?;
    Ok(Json(DataResponse { data: history }))
}
