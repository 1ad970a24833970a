use procflow_core::error::CoreError;

/// Errors returned by the engine services.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A collaborator service could not be reached or answered badly.
    #[error("Upstream service error: {0}")]
    Upstream(String),
}
