//! Repository for the `workflow_templates` table and its id allocator.

use sqlx::types::Json;
use sqlx::PgExecutor;
use procflow_core::types::DbId;

use crate::models::workflow_template::{
    CreateWorkflowTemplate, UpdateWorkflowTemplate, WorkflowTemplate,
};

/// Column list for workflow_templates queries.
const COLUMNS: &str = "id, name, description, xml_bpmn_schema, data, is_active, \
    workflow_template_category_id, access_units, errors_subscribers, \
    created_at, updated_at";

/// Counter row backing new workflow template ids.
const ID_COUNTER: &str = "workflow_templates";

/// Provides CRUD operations for workflow templates.
pub struct WorkflowTemplateRepo;

impl WorkflowTemplateRepo {
    /// Insert a workflow template with a caller-assigned id.
    ///
    /// Fails with a unique violation if the id is taken.
    pub async fn create<'e, E>(
        executor: E,
        input: &CreateWorkflowTemplate,
    ) -> Result<WorkflowTemplate, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO workflow_templates
                (id, name, description, xml_bpmn_schema, data, is_active,
                 workflow_template_category_id, access_units, errors_subscribers)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.xml_bpmn_schema)
            .bind(&input.data)
            .bind(input.is_active)
            .bind(input.workflow_template_category_id)
            .bind(&input.access_units)
            .bind(Json(&input.errors_subscribers))
            .fetch_one(executor)
            .await
    }

    /// Insert or overwrite a workflow template.
    ///
    /// An existing row keeps its `errors_subscribers`.
    pub async fn upsert<'e, E>(
        executor: E,
        input: &CreateWorkflowTemplate,
    ) -> Result<WorkflowTemplate, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO workflow_templates
                (id, name, description, xml_bpmn_schema, data, is_active,
                 workflow_template_category_id, access_units, errors_subscribers)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                xml_bpmn_schema = EXCLUDED.xml_bpmn_schema,
                data = EXCLUDED.data,
                is_active = EXCLUDED.is_active,
                workflow_template_category_id = EXCLUDED.workflow_template_category_id,
                access_units = EXCLUDED.access_units
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.xml_bpmn_schema)
            .bind(&input.data)
            .bind(input.is_active)
            .bind(input.workflow_template_category_id)
            .bind(&input.access_units)
            .bind(Json(&input.errors_subscribers))
            .fetch_one(executor)
            .await
    }

    /// Find a workflow template by its primary key.
    pub async fn find_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<WorkflowTemplate>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM workflow_templates WHERE id = $1");
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn exists<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM workflow_templates WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    /// List workflow templates with pagination, ordered by id.
    pub async fn list<'e, E>(
        executor: E,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WorkflowTemplate>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM workflow_templates
             ORDER BY id
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await
    }

    /// Replace every editable field, returning the updated row.
    pub async fn update<'e, E>(
        executor: E,
        id: DbId,
        input: &UpdateWorkflowTemplate,
    ) -> Result<Option<WorkflowTemplate>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE workflow_templates SET
                name = $1,
                description = $2,
                xml_bpmn_schema = $3,
                data = $4,
                is_active = $5,
                workflow_template_category_id = $6,
                access_units = $7,
                errors_subscribers = $8
             WHERE id = $9
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.xml_bpmn_schema)
            .bind(&input.data)
            .bind(input.is_active)
            .bind(input.workflow_template_category_id)
            .bind(&input.access_units)
            .bind(Json(&input.errors_subscribers))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Delete a workflow template. Returns `true` if a row was removed.
    pub async fn delete<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM workflow_templates WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The id the next allocation would return, without reserving it.
    pub async fn peek_next_id<'e, E>(executor: E) -> Result<DbId, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT GREATEST(
                 last_value,
                 (SELECT COALESCE(MAX(id), 0) FROM workflow_templates)
             ) + 1
             FROM id_counters WHERE name = $1",
        )
        .bind(ID_COUNTER)
        .fetch_one(executor)
        .await
    }

    /// Reserve a fresh workflow template id.
    ///
    /// The counter row stays locked until the surrounding transaction ends,
    /// so concurrent reservations are serialized.
    pub async fn reserve_next_id<'e, E>(executor: E) -> Result<DbId, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "UPDATE id_counters SET last_value = GREATEST(
                 last_value,
                 (SELECT COALESCE(MAX(id), 0) FROM workflow_templates)
             ) + 1
             WHERE name = $1
             RETURNING last_value",
        )
        .bind(ID_COUNTER)
        .fetch_one(executor)
        .await
    }
}
