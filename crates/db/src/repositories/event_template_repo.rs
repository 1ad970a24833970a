//! Repository for the `event_templates` table.

use sqlx::PgExecutor;
use procflow_core::types::DbId;

use crate::models::event_template::{CreateEventTemplate, EventTemplate};

const COLUMNS: &str = "id, name, description, event_type_id, json_schema, json_schema_raw, \
    html_template, created_at, updated_at";

pub struct EventTemplateRepo;

impl EventTemplateRepo {
    pub async fn create<'e, E>(
        executor: E,
        input: &CreateEventTemplate,
    ) -> Result<EventTemplate, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO event_templates
                (id, name, description, event_type_id, json_schema, json_schema_raw,
                 html_template)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EventTemplate>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.event_type_id)
            .bind(&input.json_schema)
            .bind(&input.json_schema_raw)
            .bind(&input.html_template)
            .fetch_one(executor)
            .await
    }

    pub async fn upsert<'e, E>(
        executor: E,
        input: &CreateEventTemplate,
    ) -> Result<EventTemplate, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO event_templates
                (id, name, description, event_type_id, json_schema, json_schema_raw,
                 html_template)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                event_type_id = EXCLUDED.event_type_id,
                json_schema = EXCLUDED.json_schema,
                json_schema_raw = EXCLUDED.json_schema_raw,
                html_template = EXCLUDED.html_template
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EventTemplate>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.event_type_id)
            .bind(&input.json_schema)
            .bind(&input.json_schema_raw)
            .bind(&input.html_template)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<EventTemplate>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM event_templates WHERE id = $1");
        sqlx::query_as::<_, EventTemplate>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_ids<'e, E>(
        executor: E,
        ids: &[DbId],
    ) -> Result<Vec<EventTemplate>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM event_templates
             WHERE id = ANY($1)
             ORDER BY array_position($1, id)"
        );
        sqlx::query_as::<_, EventTemplate>(&query)
            .bind(ids)
            .fetch_all(executor)
            .await
    }

    pub async fn delete_by_ids<'e, E>(executor: E, ids: &[DbId]) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM event_templates WHERE id = ANY($1)")
            .bind(ids)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
