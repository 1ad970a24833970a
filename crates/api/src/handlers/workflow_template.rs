//! Handlers for the `/workflow-templates` resource.
//!
//! Mutations on an existing template check the `Last-Workflow-History-Id`
//! header before touching anything and answer with the id of the newest
//! history row.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use procflow_core::types::DbId;
use procflow_db::models::workflow_template::{CreateWorkflowTemplate, UpdateWorkflowTemplate};

use crate::error::AppResult;
use crate::middleware::actor::RequestActor;
use crate::middleware::auth::AuthUser;
use crate::middleware::history::LastHistoryId;
use crate::query::PaginationParams;
use crate::response::{history_headers, DataResponse};
use crate::state::AppState;

/// GET /api/v1/workflow-templates
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.clamped();
    let templates = state.templates.list(limit, offset).await?;
    Ok(Json(DataResponse { data: templates }))
}

/// POST /api/v1/workflow-templates
pub async fn create(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Json(input): Json<CreateWorkflowTemplate>,
) -> AppResult<impl IntoResponse> {
    let template = state.templates.create(input, &actor).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: template })))
}

/// GET /api/v1/workflow-templates/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let template = state.templates.get(id).await?;
    let last_history_id = state.versions.last_history_id(id).await?;
    Ok((
        history_headers(last_history_id),
        Json(DataResponse { data: template }),
    ))
}

/// PUT /api/v1/workflow-templates/{id}
///
/// Full replace, followed by a debounced auto-save.
pub async fn update(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    LastHistoryId(last_history_id): LastHistoryId,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateWorkflowTemplate>,
) -> AppResult<impl IntoResponse> {
    state.versions.ensure_fresh(id, last_history_id).await?;
    let (template, _history) = state.templates.update(id, input, &actor).await?;
    let last_history_id = state.versions.last_history_id(id).await?;
    Ok((
        history_headers(last_history_id),
        Json(DataResponse { data: template }),
    ))
}

/// DELETE /api/v1/workflow-templates/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    LastHistoryId(last_history_id): LastHistoryId,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.versions.ensure_fresh(id, last_history_id).await?;
    state.templates.delete(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/workflow-templates/{id}/auto-save
///
/// Called by the editor after it changes a dependent template. Answers with
/// the new history row, or `null` when the save was debounced.
pub async fn auto_save(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    LastHistoryId(last_history_id): LastHistoryId,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.versions.ensure_fresh(id, last_history_id).await?;
    let history = state.versions.auto_save(id, &actor).await?;
    let last_history_id = state.versions.last_history_id(id).await?;
    Ok((
        history_headers(last_history_id),
        Json(DataResponse { data: history }),
    ))
}
