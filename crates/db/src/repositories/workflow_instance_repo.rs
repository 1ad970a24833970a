//! Repository for the `workflows` table.

use sqlx::PgExecutor;
use procflow_core::types::DbId;

use crate::models::workflow_instance::{CreateWorkflowInstance, WorkflowInstance};

const COLUMNS: &str = "id, workflow_template_id, name, created_at, updated_at";

pub struct WorkflowInstanceRepo;

impl WorkflowInstanceRepo {
    pub async fn create<'e, E>(
        executor: E,
        input: &CreateWorkflowInstance,
    ) -> Result<WorkflowInstance, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO workflows (workflow_template_id, name)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkflowInstance>(&query)
            .bind(input.workflow_template_id)
            .bind(&input.name)
            .fetch_one(executor)
            .await
    }
}
