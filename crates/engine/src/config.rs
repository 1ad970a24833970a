use std::time::Duration;

use procflow_core::types::DbId;

/// Engine tunables loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum gap between two auto-save rows from the same user and address.
    pub auto_save_version_after: Duration,
    /// Lifetime of a prepared copy.
    pub staged_copy_ttl: Duration,
    /// New workflow template ids must stay below this value.
    pub workflow_template_id_ceiling: DbId,
    /// Base URL of the register service.
    pub register_service_url: String,
    /// Page size used when fetching register keys.
    pub register_keys_limit: u32,
    /// Prepended to the name and description of a copied template.
    pub copy_name_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_save_version_after: Duration::from_secs(300),
            staged_copy_ttl: Duration::from_secs(900),
            workflow_template_id_ceiling: 2_147_483,
            register_service_url: "http://localhost:8081".to_string(),
            register_keys_limit: 100_000,
            copy_name_prefix: "Copy - ".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `AUTO_SAVE_VERSION_AFTER_SECS`  | `300`                   |
    /// | `STAGED_COPY_TTL_SECS`          | `900`                   |
    /// | `WORKFLOW_TEMPLATE_ID_CEILING`  | `2147483`               |
    /// | `REGISTER_SERVICE_URL`          | `http://localhost:8081` |
    /// | `REGISTER_KEYS_LIMIT`           | `100000`                |
    /// | `COPY_NAME_PREFIX`              | `Copy - `               |
    ///
    /// # Panics
    ///
    /// Panics if a numeric variable is set but does not parse.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let auto_save_secs: u64 = std::env::var("AUTO_SAVE_VERSION_AFTER_SECS")
            .map(|v| v.parse().expect("AUTO_SAVE_VERSION_AFTER_SECS must be a valid u64"))
            .unwrap_or(defaults.auto_save_version_after.as_secs());

        let ttl_secs: u64 = std::env::var("STAGED_COPY_TTL_SECS")
            .map(|v| v.parse().expect("STAGED_COPY_TTL_SECS must be a valid u64"))
            .unwrap_or(defaults.staged_copy_ttl.as_secs());

        let workflow_template_id_ceiling: DbId = std::env::var("WORKFLOW_TEMPLATE_ID_CEILING")
            .map(|v| v.parse().expect("WORKFLOW_TEMPLATE_ID_CEILING must be a valid i64"))
            .unwrap_or(defaults.workflow_template_id_ceiling);

        let register_service_url = std::env::var("REGISTER_SERVICE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.register_service_url);

        let register_keys_limit: u32 = std::env::var("REGISTER_KEYS_LIMIT")
            .map(|v| v.parse().expect("REGISTER_KEYS_LIMIT must be a valid u32"))
            .unwrap_or(defaults.register_keys_limit);

        let copy_name_prefix =
            std::env::var("COPY_NAME_PREFIX").unwrap_or(defaults.copy_name_prefix);

        Self {
            auto_save_version_after: Duration::from_secs(auto_save_secs),
            staged_copy_ttl: Duration::from_secs(ttl_secs),
            workflow_template_id_ceiling,
            register_service_url,
            register_keys_limit,
            copy_name_prefix,
        }
    }

    /// Debounce window as a chrono duration.
    pub fn auto_save_delay(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.auto_save_version_after)
            .unwrap_or_else(|_| chrono::Duration::seconds(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.auto_save_version_after, Duration::from_secs(300));
        assert_eq!(config.staged_copy_ttl, Duration::from_secs(900));
        assert_eq!(config.workflow_template_id_ceiling, 2_147_483);
        assert_eq!(config.copy_name_prefix, "Copy - ");
        assert_eq!(config.auto_save_delay(), chrono::Duration::seconds(300));
    }
}
