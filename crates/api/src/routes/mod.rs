pub mod health;
pub mod workflow_template;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /workflow-templates                              list, create
/// /workflow-templates/import                       import graph (POST)
/// /workflow-templates/{id}                         get, update, delete
/// /workflow-templates/{id}/auto-save               auto-save snapshot (POST)
/// /workflow-templates/{id}/versions                list, save version
/// /workflow-templates/{id}/versions/{version}      get version snapshot
/// /workflow-templates/{id}/export                  download graph (GET)
/// /workflow-templates/{id}/copy/prepare            stage a copy (POST)
/// /workflow-templates/{id}/copy/commit             commit a staged copy (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Workflow templates and everything hanging off them.
        .nest("/workflow-templates", workflow_template::router())
}
