//! Repository for the `gateway_templates` table.

use sqlx::PgExecutor;
use procflow_core::types::DbId;

use crate::models::gateway_template::{CreateGatewayTemplate, GatewayTemplate};

const COLUMNS: &str = "id, name, description, gateway_type_id, json_schema, json_schema_raw, \
    created_at, updated_at";

pub struct GatewayTemplateRepo;

impl GatewayTemplateRepo {
    pub async fn create<'e, E>(
        executor: E,
        input: &CreateGatewayTemplate,
    ) -> Result<GatewayTemplate, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO gateway_templates
                (id, name, description, gateway_type_id, json_schema, json_schema_raw)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GatewayTemplate>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.gateway_type_id)
            .bind(&input.json_schema)
            .bind(&input.json_schema_raw)
            .fetch_one(executor)
            .await
    }

    pub async fn upsert<'e, E>(
        executor: E,
        input: &CreateGatewayTemplate,
    ) -> Result<GatewayTemplate, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO gateway_templates
                (id, name, description, gateway_type_id, json_schema, json_schema_raw)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                gateway_type_id = EXCLUDED.gateway_type_id,
                json_schema = EXCLUDED.json_schema,
                json_schema_raw = EXCLUDED.json_schema_raw
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GatewayTemplate>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.gateway_type_id)
            .bind(&input.json_schema)
            .bind(&input.json_schema_raw)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<GatewayTemplate>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM gateway_templates WHERE id = $1");
        sqlx::query_as::<_, GatewayTemplate>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_ids<'e, E>(
        executor: E,
        ids: &[DbId],
    ) -> Result<Vec<GatewayTemplate>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM gateway_templates
             WHERE id = ANY($1)
             ORDER BY array_position($1, id)"
        );
        sqlx::query_as::<_, GatewayTemplate>(&query)
            .bind(ids)
            .fetch_all(executor)
            .await
    }

    pub async fn delete_by_ids<'e, E>(executor: E, ids: &[DbId]) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM gateway_templates WHERE id = ANY($1)")
            .bind(ids)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
