//! Route definitions for workflow templates, their history and transfers.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{workflow_copy, workflow_history, workflow_template, workflow_transfer};
use crate::state::AppState;

/// Routes mounted at `/workflow-templates`.
///
/// Every route requires a bearer token (enforced by handler extractors).
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create
/// POST   /import                    -> import
/// GET    /{id}                      -> get_by_id
/// PUT    /{id}                      -> update
/// DELETE /{id}                      -> delete
/// POST   /{id}/auto-save            -> auto_save
/// GET    /{id}/versions             -> list_versions
/// POST   /{id}/versions             -> save_version
/// GET    /{id}/versions/{version}   -> get_version
/// GET    /{id}/export               -> export
/// POST   /{id}/copy/prepare         -> prepare
/// POST   /{id}/copy/commit          -> commit
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(workflow_template::list).post(workflow_template::create),
        )
        .route("/import", post(workflow_transfer::import))
        .route(
            "/{id}",
            get(workflow_template::get_by_id)
                .put(workflow_template::update)
                .delete(workflow_template::delete),
        )
        .route("/{id}/auto-save", post(workflow_template::auto_save))
        .route(
            "/{id}/versions",
            get(workflow_history::list_versions).post(workflow_history::save_version),
        )
        .route("/{id}/versions/{version}", get(workflow_history::get_version))
        .route("/{id}/export", get(workflow_transfer::export))
        .route("/{id}/copy/prepare", post(workflow_copy::prepare))
        .route("/{id}/copy/commit", post(workflow_copy::commit))
}
