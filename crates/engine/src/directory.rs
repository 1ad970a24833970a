//! Lookups against collaborators that own register keys and units.
//!
//! Import validation depends only on these traits. Production uses the
//! register service over HTTP and the `units` table; tests plug in fixed sets.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use procflow_core::types::DbId;
use procflow_db::repositories::UnitRepo;
use procflow_db::DbPool;

use crate::error::EngineError;

/// Source of the register key ids available in this environment.
#[async_trait]
pub trait RegisterKeyDirectory: Send + Sync {
    async fn available_key_ids(&self) -> Result<HashSet<DbId>, EngineError>;
}

/// Existence check for organisational units.
#[async_trait]
pub trait UnitDirectory: Send + Sync {
    async fn unit_exists(&self, unit_id: DbId) -> Result<bool, EngineError>;
}

// ---------------------------------------------------------------------------
// Register service over HTTP
// ---------------------------------------------------------------------------

/// HTTP request timeout for register key lookups.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct KeysPage {
    data: Vec<KeyEntry>,
}

#[derive(Debug, Deserialize)]
struct KeyEntry {
    id: DbId,
}

/// Reads register keys from `GET {base_url}/keys?limit=N`.
pub struct HttpRegisterKeyDirectory {
    client: reqwest::Client,
    base_url: String,
    limit: u32,
}

impl HttpRegisterKeyDirectory {
    pub fn new(base_url: impl Into<String>, limit: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            base_url: base_url.into(),
            limit,
        }
    }
}

#[async_trait]
impl RegisterKeyDirectory for HttpRegisterKeyDirectory {
    async fn available_key_ids(&self) -> Result<HashSet<DbId>, EngineError> {
        let url = format!("{}/keys", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("limit", self.limit)])
            .send()
            .await
            .map_err(|e| EngineError::Upstream(format!("register service unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(EngineError::Upstream(format!(
                "register service returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let page: KeysPage = response
            .json()
            .await
            .map_err(|e| EngineError::Upstream(format!("unexpected register keys payload: {e}")))?;

        tracing::debug!(count = page.data.len(), "Fetched register keys");
        Ok(page.data.into_iter().map(|k| k.id).collect())
    }
}

// ---------------------------------------------------------------------------
// Units from Postgres
// ---------------------------------------------------------------------------

/// Checks units against the `units` table.
pub struct PgUnitDirectory {
    pool: DbPool,
}

impl PgUnitDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitDirectory for PgUnitDirectory {
    async fn unit_exists(&self, unit_id: DbId) -> Result<bool, EngineError> {
        Ok(UnitRepo::find_by_id(&self.pool, unit_id).await?.is_some())
    }
}
