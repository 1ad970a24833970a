//! Repository for the `workflow_template_categories` table.

use sqlx::PgExecutor;
use procflow_core::types::DbId;

use crate::models::workflow_template_category::{
    CreateWorkflowTemplateCategory, WorkflowTemplateCategory,
};

const COLUMNS: &str = "id, name, parent_id, created_at, updated_at";

pub struct WorkflowTemplateCategoryRepo;

impl WorkflowTemplateCategoryRepo {
    /// Insert or overwrite a category with a known id.
    pub async fn upsert<'e, E>(
        executor: E,
        input: &CreateWorkflowTemplateCategory,
    ) -> Result<WorkflowTemplateCategory, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO workflow_template_categories (id, name, parent_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                parent_id = EXCLUDED.parent_id
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkflowTemplateCategory>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(input.parent_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<WorkflowTemplateCategory>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM workflow_template_categories WHERE id = $1");
        sqlx::query_as::<_, WorkflowTemplateCategory>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }
}
