//! Bearer token and role middleware for the HTTP layer.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use turnstile_auth::{Principal, Role, SessionManager};
use turnstile_telemetry::AuthOutcome;

use crate::http::constants::BEARER_PREFIX;
use crate::http::errors::ApiError;
use crate::state::ApiState;

/// Verify the bearer access token and expose the caller as a [`Principal`] extension.
pub(crate) async fn require_bearer(
    State(state): State<Arc<ApiState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&req)
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;

    let principal = match state.sessions.verify_access(&token) {
        Ok(principal) => principal,
        Err(err) => {
            state
                .telemetry
                .inc_auth_event("verify_access", AuthOutcome::Rejected);
            return Err(err.into());
        }
    };
    debug!(identity = %principal.identity, role = %principal.role, "bearer accepted");

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Reject callers whose access token does not carry the admin role.
///
/// Must run after [`require_bearer`].
pub(crate) async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
    SessionManager::authorize(principal, Role::Admin)?;
    Ok(next.run(req).await)
}

pub(crate) fn extract_bearer(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
