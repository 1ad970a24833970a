use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use procflow_core::error::CoreError;
use procflow_engine::EngineError;
use serde_json::{json, Value};

/// Error returned by every handler.
///
/// Renders as `{"error": <message>, "code": <CODE>}` with `details` added for
/// import failures. Server-side failures are logged and replaced by a generic
/// message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The register service failed or answered with garbage.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Something addressed by other than its id is missing, e.g. a version.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Core(core) => AppError::Core(core),
            EngineError::Database(db) => AppError::Database(db),
            EngineError::Upstream(msg) => AppError::Upstream(msg),
        }
    }
}

/// Status, machine code and message of one error response.
struct Rendered {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Value>,
}

impl Rendered {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred",
        )
    }
}

fn render_core(err: &CoreError) -> Rendered {
    match err {
        CoreError::NotFound { entity, id } => Rendered::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => {
            Rendered::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.as_str())
        }
        CoreError::Conflict(msg) => Rendered::new(StatusCode::CONFLICT, "CONFLICT", msg.as_str()),
        CoreError::InvalidXml(msg) => Rendered::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_XML",
            format!("Invalid BPMN schema: {msg}"),
        ),
        CoreError::AlreadyCommitted { .. } => {
            Rendered::new(StatusCode::CONFLICT, "ALREADY_COMMITTED", err.to_string())
        }
        CoreError::WorkflowImport(issues) => {
            let details = issues
                .iter()
                .map(|issue| json!({ "message": issue.to_string(), "issue": issue }))
                .collect::<Vec<_>>();
            Rendered {
                details: Some(Value::Array(details)),
                ..Rendered::new(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "WORKFLOW_IMPORT_ERROR",
                    err.to_string(),
                )
            }
        }
        CoreError::TemplateInUse { .. } => Rendered::new(
            StatusCode::CONFLICT,
            "TEMPLATE_IN_USE",
            "Some process has already started from this template",
        ),
        CoreError::StaleHistory { .. } => {
            Rendered::new(StatusCode::CONFLICT, "HEADER_EXPIRED", err.to_string())
        }
        CoreError::StagedCopyNotFound => {
            Rendered::new(StatusCode::GONE, "STAGED_COPY_NOT_FOUND", err.to_string())
        }
        CoreError::Unauthorized(msg) => {
            Rendered::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.as_str())
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            Rendered::internal()
        }
    }
}

/// Only named unique constraints (`uq_*`) surface as conflicts. Any other
/// database failure is logged and hidden.
fn render_sqlx(err: &sqlx::Error) -> Rendered {
    if let sqlx::Error::RowNotFound = err {
        return Rendered::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found");
    }

    let unique_constraint = err
        .as_database_error()
        .filter(|db| db.code().as_deref() == Some("23505"))
        .and_then(|db| db.constraint())
        .filter(|name| name.starts_with("uq_"));
    if let Some(constraint) = unique_constraint {
        return Rendered::new(
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Duplicate value violates unique constraint: {constraint}"),
        );
    }

    tracing::error!(error = %err, "Database error");
    Rendered::internal()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let rendered = match &self {
            AppError::Core(core) => render_core(core),
            AppError::Database(err) => render_sqlx(err),
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "Register service error");
                Rendered::new(
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "A dependent service is unavailable",
                )
            }
            AppError::BadRequest(msg) => {
                Rendered::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.as_str())
            }
            AppError::NotFound(msg) => {
                Rendered::new(StatusCode::NOT_FOUND, "NOT_FOUND", msg.as_str())
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                Rendered::internal()
            }
        };

        let mut body = json!({ "error": rendered.message, "code": rendered.code });
        if let Some(details) = rendered.details {
            body["details"] = details;
        }
        (rendered.status, axum::Json(body)).into_response()
    }
}
