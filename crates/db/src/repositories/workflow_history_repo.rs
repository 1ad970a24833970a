//! Repository for the `workflow_histories` table.
//!
//! The single-current-version rule is enforced twice: callers clear the flag
//! before inserting a current row, and `uq_workflow_histories_current`
//! rejects a second current row outright.

use sqlx::PgExecutor;
use procflow_core::types::DbId;

use crate::models::workflow_history::{
    CreateWorkflowHistory, WorkflowHistory, WorkflowHistorySummary,
};

/// Column list for workflow_histories queries.
const COLUMNS: &str = "id, workflow_template_id, user_id, data, version, is_current_version, \
    meta, name, description, created_at, updated_at";

/// Column list for version listings (no snapshot).
const SUMMARY_COLUMNS: &str = "id, workflow_template_id, user_id, version, is_current_version, \
    name, description, created_at";

/// Provides append and lookup operations for workflow history.
pub struct WorkflowHistoryRepo;

impl WorkflowHistoryRepo {
    /// Append a history row.
    pub async fn create<'e, E>(
        executor: E,
        input: &CreateWorkflowHistory,
    ) -> Result<WorkflowHistory, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO workflow_histories
                (workflow_template_id, user_id, data, version, is_current_version,
                 meta, name, description)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkflowHistory>(&query)
            .bind(input.workflow_template_id)
            .bind(&input.user_id)
            .bind(&input.data)
            .bind(&input.version)
            .bind(input.is_current_version)
            .bind(&input.meta)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<WorkflowHistory>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM workflow_histories WHERE id = $1");
        sqlx::query_as::<_, WorkflowHistory>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// The most recent row of any kind, auto-saves included.
    pub async fn find_last_by_workflow_template_id<'e, E>(
        executor: E,
        workflow_template_id: DbId,
    ) -> Result<Option<WorkflowHistory>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM workflow_histories
             WHERE workflow_template_id = $1
             ORDER BY id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, WorkflowHistory>(&query)
            .bind(workflow_template_id)
            .fetch_optional(executor)
            .await
    }

    /// The most recent row that carries a version.
    pub async fn find_last_version_by_workflow_template_id<'e, E>(
        executor: E,
        workflow_template_id: DbId,
    ) -> Result<Option<WorkflowHistory>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM workflow_histories
             WHERE workflow_template_id = $1 AND version IS NOT NULL
             ORDER BY id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, WorkflowHistory>(&query)
            .bind(workflow_template_id)
            .fetch_optional(executor)
            .await
    }

    /// Id of the most recent row, used for the stale-header check.
    pub async fn find_last_id<'e, E>(
        executor: E,
        workflow_template_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT id FROM workflow_histories
             WHERE workflow_template_id = $1
             ORDER BY id DESC
             LIMIT 1",
        )
        .bind(workflow_template_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_current<'e, E>(
        executor: E,
        workflow_template_id: DbId,
    ) -> Result<Option<WorkflowHistory>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM workflow_histories
             WHERE workflow_template_id = $1 AND is_current_version"
        );
        sqlx::query_as::<_, WorkflowHistory>(&query)
            .bind(workflow_template_id)
            .fetch_optional(executor)
            .await
    }

    /// Clear the current-version flag on every row of the template.
    pub async fn clear_current_version<'e, E>(
        executor: E,
        workflow_template_id: DbId,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE workflow_histories SET is_current_version = FALSE
             WHERE workflow_template_id = $1 AND is_current_version",
        )
        .bind(workflow_template_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_by_workflow_template_id<'e, E>(
        executor: E,
        workflow_template_id: DbId,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM workflow_histories WHERE workflow_template_id = $1")
            .bind(workflow_template_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Version-bearing rows, newest first.
    pub async fn list_versions<'e, E>(
        executor: E,
        workflow_template_id: DbId,
    ) -> Result<Vec<WorkflowHistorySummary>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM workflow_histories
             WHERE workflow_template_id = $1 AND version IS NOT NULL
             ORDER BY id DESC"
        );
        sqlx::query_as::<_, WorkflowHistorySummary>(&query)
            .bind(workflow_template_id)
            .fetch_all(executor)
            .await
    }

    /// The newest row recorded under `version`.
    pub async fn find_by_workflow_template_id_and_version<'e, E>(
        executor: E,
        workflow_template_id: DbId,
        version: &str,
    ) -> Result<Option<WorkflowHistory>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM workflow_histories
             WHERE workflow_template_id = $1 AND version = $2
             ORDER BY id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, WorkflowHistory>(&query)
            .bind(workflow_template_id)
            .bind(version)
            .fetch_optional(executor)
            .await
    }
}
