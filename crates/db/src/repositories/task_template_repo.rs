//! Repository for the `task_templates` table.

use sqlx::PgExecutor;
use procflow_core::types::DbId;

use crate::models::task_template::{CreateTaskTemplate, TaskTemplate};

/// Column list for task_templates queries.
const COLUMNS: &str = "id, name, document_template_id, json_schema, json_schema_raw, \
    html_template, created_at, updated_at";

/// Provides CRUD operations for task templates.
pub struct TaskTemplateRepo;

impl TaskTemplateRepo {
    pub async fn create<'e, E>(
        executor: E,
        input: &CreateTaskTemplate,
    ) -> Result<TaskTemplate, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO task_templates
                (id, name, document_template_id, json_schema, json_schema_raw, html_template)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskTemplate>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(input.document_template_id)
            .bind(&input.json_schema)
            .bind(&input.json_schema_raw)
            .bind(&input.html_template)
            .fetch_one(executor)
            .await
    }

    pub async fn upsert<'e, E>(
        executor: E,
        input: &CreateTaskTemplate,
    ) -> Result<TaskTemplate, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO task_templates
                (id, name, document_template_id, json_schema, json_schema_raw, html_template)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                document_template_id = EXCLUDED.document_template_id,
                json_schema = EXCLUDED.json_schema,
                json_schema_raw = EXCLUDED.json_schema_raw,
                html_template = EXCLUDED.html_template
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskTemplate>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(input.document_template_id)
            .bind(&input.json_schema)
            .bind(&input.json_schema_raw)
            .bind(&input.html_template)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<TaskTemplate>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM task_templates WHERE id = $1");
        sqlx::query_as::<_, TaskTemplate>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Fetch the existing rows among `ids`, in the order given.
    pub async fn find_by_ids<'e, E>(
        executor: E,
        ids: &[DbId],
    ) -> Result<Vec<TaskTemplate>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM task_templates
             WHERE id = ANY($1)
             ORDER BY array_position($1, id)"
        );
        sqlx::query_as::<_, TaskTemplate>(&query)
            .bind(ids)
            .fetch_all(executor)
            .await
    }

    pub async fn delete_by_ids<'e, E>(executor: E, ids: &[DbId]) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM task_templates WHERE id = ANY($1)")
            .bind(ids)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
