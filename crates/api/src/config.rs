use std::str::FromStr;

use procflow_engine::EngineConfig;

use crate::auth::jwt::JwtConfig;

/// HTTP server settings, read once at startup.
///
/// | Env Var                 | Default                 |
/// |-------------------------|-------------------------|
/// | `HOST`                  | `0.0.0.0`               |
/// | `PORT`                  | `3000`                  |
/// | `CORS_ORIGINS`          | `http://localhost:5173` |
/// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
/// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
///
/// Token settings come from [`JwtConfig::from_env`], engine tunables from
/// [`EngineConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins the template editor is served from.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Drain window for the event writer and the copy sweep.
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub engine: EngineConfig,
}

/// `key` parsed as `T`, or `default` when unset.
///
/// Panics on a value that does not parse, so a typo fails startup.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}

/// Comma-separated origins with blanks dropped.
fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let origins = env_or("CORS_ORIGINS", "http://localhost:5173".to_string());

        Self {
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: env_or("PORT", 3000),
            cors_origins: split_origins(&origins),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            jwt: JwtConfig::from_env(),
            engine: EngineConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blanks_skipped() {
        assert_eq!(
            split_origins(" https://editor.local , ,http://localhost:5173,"),
            vec!["https://editor.local", "http://localhost:5173"]
        );
    }

    #[test]
    fn unset_variable_falls_back_to_default() {
        assert_eq!(env_or("PROCFLOW_TEST_UNSET_PORT", 3000u16), 3000);
    }
}
