//! Connection admission
//!
//! Origin allowlist for incoming connections. Channels from non-allowlisted
//! origins are rejected at the HTTP layer, before upgrade, so the
//! coordinator never sees events from a connection that should not exist.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request, Response, StatusCode},
    middleware::Next,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Origin admission policy
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    /// Allowed origins (None = allow all)
    pub allowed: Option<Vec<String>>,
}

impl OriginPolicy {
    /// Load the policy from the ALLOWED_ORIGINS environment variable
    /// (comma-separated). Unset or empty disables the allowlist.
    pub fn from_env() -> Self {
        let allowed = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().trim_end_matches('/').to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty());

        match &allowed {
            Some(origins) => {
                tracing::info!("Origin allowlist enabled: {:?}", origins);
            }
            None => {
                tracing::warn!("ALLOWED_ORIGINS not set - any origin may connect!");
            }
        }

        Self { allowed }
    }

    pub fn is_enabled(&self) -> bool {
        self.allowed.is_some()
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        match &self.allowed {
            Some(list) => list.iter().any(|o| o == origin),
            None => true,
        }
    }
}

/// Middleware rejecting requests whose Origin header is not allowlisted.
///
/// Requests without an Origin header (non-browser clients) pass through;
/// the allowlist is a browser cross-origin guard, not an auth scheme.
pub async fn origin_admission_middleware(
    State(policy): State<Arc<OriginPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if !policy.is_enabled() {
        return next.run(request).await;
    }

    match request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
    {
        Some(origin) if !policy.is_allowed(origin) => {
            tracing::warn!("Rejected connection from origin '{}'", origin);
            Response::builder()
                .status(StatusCode::FORBIDDEN)
                .body(Body::from("Origin not allowed"))
                .unwrap()
        }
        _ => next.run(request).await,
    }
}

/// CORS layer for the REST routes, built from the same policy.
pub fn cors_layer(policy: &OriginPolicy) -> CorsLayer {
    match &policy.allowed {
        Some(origins) => {
            let parsed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match o.parse() {
                    Ok(v) => Some(v),
                    Err(_) => {
                        tracing::warn!("Ignoring unparseable origin '{}'", o);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parsed))
                .allow_methods([Method::GET, Method::POST])
        }
        None => CorsLayer::permissive(),
    }
}
