//! Repository for the `units` table.

use sqlx::PgExecutor;
use procflow_core::types::DbId;

use crate::models::unit::{CreateUnit, Unit};

const COLUMNS: &str = "id, name, created_at, updated_at";

pub struct UnitRepo;

impl UnitRepo {
    pub async fn create<'e, E>(executor: E, input: &CreateUnit) -> Result<Unit, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("INSERT INTO units (name) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Unit>(&query)
            .bind(&input.name)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Unit>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM units WHERE id = $1");
        sqlx::query_as::<_, Unit>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }
}
