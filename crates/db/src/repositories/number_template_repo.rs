//! Repository for the `number_templates` table.

use sqlx::PgExecutor;
use procflow_core::types::DbId;

use crate::models::number_template::{CreateNumberTemplate, NumberTemplate};

const COLUMNS: &str = "id, name, rule_template, created_at, updated_at";

pub struct NumberTemplateRepo;

impl NumberTemplateRepo {
    pub async fn create<'e, E>(
        executor: E,
        input: &CreateNumberTemplate,
    ) -> Result<NumberTemplate, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO number_templates (id, name, rule_template)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NumberTemplate>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(&input.rule_template)
            .fetch_one(executor)
            .await
    }

    pub async fn upsert<'e, E>(
        executor: E,
        input: &CreateNumberTemplate,
    ) -> Result<NumberTemplate, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO number_templates (id, name, rule_template)
             VALUES ($1, $2, $3)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                rule_template = EXCLUDED.rule_template
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NumberTemplate>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(&input.rule_template)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<NumberTemplate>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM number_templates WHERE id = $1");
        sqlx::query_as::<_, NumberTemplate>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn exists<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM number_templates WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await
    }
}
