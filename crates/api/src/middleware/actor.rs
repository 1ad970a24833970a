//! The acting user together with the request context recorded on history rows.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use procflow_engine::{Actor, RequestMeta};

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Authenticated [`Actor`] for service calls.
#[derive(Debug, Clone)]
pub struct RequestActor(pub Actor);

impl FromRequestParts<AppState> for RequestActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequestActor(Actor::new(user.user_id, request_meta(&parts.headers))))
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Forwarding, client and agent headers of the request.
pub fn request_meta(headers: &HeaderMap) -> RequestMeta {
    RequestMeta {
        x_forwarded_for: header(headers, "x-forwarded-for"),
        user_agent: header(headers, "user-agent"),
        ip: header(headers, "x-real-ip"),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn meta_reads_known_headers_and_skips_blank_ones() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        headers.insert("user-agent", HeaderValue::from_static("  "));
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.5"));

        let meta = request_meta(&headers);
        assert_eq!(meta.x_forwarded_for.as_deref(), Some("10.0.0.1, 10.0.0.2"));
        assert_eq!(meta.user_agent, None);
        assert_eq!(meta.ip.as_deref(), Some("192.168.1.5"));
    }
}
