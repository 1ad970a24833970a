//! Two-phase copy of a workflow template.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use procflow_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::actor::RequestActor;
use crate::response::{history_headers, DataResponse};
use crate::state::AppState;

/// Body of a copy commit.
#[derive(Debug, Deserialize)]
pub struct CommitCopyRequest {
    pub request_token: String,
    /// Diffs whose literals must be left as they are.
    #[serde(default)]
    pub excluded_diff_ids: Vec<Uuid>,
}

/// POST /api/v1/workflow-templates/{id}/copy/prepare
pub async fn prepare(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let preparation = state.copy.prepare(id, &actor).await?;
    Ok(Json(DataResponse { data: preparation }))
}

/// POST /api/v1/workflow-templates/{id}/copy/commit
pub async fn commit(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<DbId>,
    Json(body): Json<CommitCopyRequest>,
) -> AppResult<impl IntoResponse> {
    let result = state
        .copy
        .commit(id, &body.request_token, &body.excluded_diff_ids, &actor)
        .await?;
    let last_history_id = state
        .versions
        .last_history_id(result.new_workflow_template_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        history_headers(last_history_id),
        Json(DataResponse { data: result }),
    ))
}
