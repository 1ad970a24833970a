//! Who is acting and from where.

use serde::Serialize;
use procflow_core::types::SYSTEM_USER_ID;

/// Request context recorded on history rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestMeta {
    pub x_forwarded_for: Option<String>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

/// The authenticated user behind a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub meta: RequestMeta,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, meta: RequestMeta) -> Self {
        Self {
            user_id: user_id.into(),
            meta,
        }
    }

    /// The actor used when no user is attached to a mutation.
    pub fn system() -> Self {
        Self::new(SYSTEM_USER_ID, RequestMeta::default())
    }

    /// JSON stored in `workflow_histories.meta`.
    pub fn meta_json(&self) -> serde_json::Value {
        serde_json::json!({
            "user_id": self.user_id,
            "x_forwarded_for": self.meta.x_forwarded_for,
            "user_agent": self.meta.user_agent,
            "ip": self.meta.ip,
        })
    }
}
