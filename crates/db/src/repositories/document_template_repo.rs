//! Repository for the `document_templates` table.

use sqlx::PgExecutor;
use procflow_core::types::DbId;

use crate::models::document_template::{CreateDocumentTemplate, DocumentTemplate};

/// Column list for document_templates queries.
const COLUMNS: &str = "id, name, description, json_schema, json_schema_raw, html_template, \
    created_at, updated_at";

/// Provides CRUD operations for document templates.
pub struct DocumentTemplateRepo;

impl DocumentTemplateRepo {
    /// Insert a document template. A taken id is a unique violation.
    pub async fn create<'e, E>(
        executor: E,
        input: &CreateDocumentTemplate,
    ) -> Result<DocumentTemplate, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO document_templates
                (id, name, description, json_schema, json_schema_raw, html_template)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocumentTemplate>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.json_schema)
            .bind(&input.json_schema_raw)
            .bind(&input.html_template)
            .fetch_one(executor)
            .await
    }

    /// Insert or overwrite a document template.
    pub async fn upsert<'e, E>(
        executor: E,
        input: &CreateDocumentTemplate,
    ) -> Result<DocumentTemplate, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO document_templates
                (id, name, description, json_schema, json_schema_raw, html_template)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                json_schema = EXCLUDED.json_schema,
                json_schema_raw = EXCLUDED.json_schema_raw,
                html_template = EXCLUDED.html_template
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocumentTemplate>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.json_schema)
            .bind(&input.json_schema_raw)
            .bind(&input.html_template)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<DocumentTemplate>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM document_templates WHERE id = $1");
        sqlx::query_as::<_, DocumentTemplate>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Fetch the existing rows among `ids`, in the order given.
    pub async fn find_by_ids<'e, E>(
        executor: E,
        ids: &[DbId],
    ) -> Result<Vec<DocumentTemplate>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM document_templates
             WHERE id = ANY($1)
             ORDER BY array_position($1, id)"
        );
        sqlx::query_as::<_, DocumentTemplate>(&query)
            .bind(ids)
            .fetch_all(executor)
            .await
    }

    /// Delete every row among `ids`, returning how many were removed.
    pub async fn delete_by_ids<'e, E>(executor: E, ids: &[DbId]) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM document_templates WHERE id = ANY($1)")
            .bind(ids)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
