//! Session endpoints: signup, login, refresh, logout, and the caller's profile.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
};
use turnstile_auth::{AuthResult, PasswordChange, Principal, Registration};
use turnstile_telemetry::{AuthOutcome, Metrics};

use crate::http::errors::ApiError;
use crate::models::{
    ChangePasswordRequest, LoginRequest, MessageResponse, ProfileResponse, RefreshRequest,
    SignupRequest, SignupResponse, TokenResponse,
};
use crate::state::ApiState;

fn record<T>(telemetry: &Metrics, event: &str, result: &AuthResult<T>) {
    let outcome = match result {
        Ok(_) => AuthOutcome::Success,
        Err(err) if err.is_internal() => AuthOutcome::Error,
        Err(_) => AuthOutcome::Rejected,
    };
    telemetry.inc_auth_event(event, outcome);
}

pub(crate) async fn signup(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let result = state
        .sessions
        .register(Registration {
            identity: request.username,
            email: request.email,
            password: request.password,
            elevation_claim: request.admin_code,
        })
        .await;
    record(&state.telemetry, "register", &result);
    let record = result?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered successfully".to_string(),
            username: record.identity,
            role: record.role,
        }),
    ))
}

pub(crate) async fn login(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let result = state
        .sessions
        .authenticate(&request.email, &request.password)
        .await;
    record(&state.telemetry, "login", &result);
    Ok(Json(TokenResponse::new("Login successful", result?)))
}

pub(crate) async fn refresh(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = request
        .into_token()
        .ok_or_else(|| ApiError::unauthorized("missing refresh token"))?;
    let result = state.sessions.refresh(&token).await;
    record(&state.telemetry, "refresh", &result);
    Ok(Json(TokenResponse::new("Token refreshed", result?)))
}

pub(crate) async fn logout(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = request
        .into_token()
        .ok_or_else(|| ApiError::bad_request("missing refresh token"))?;
    let result = state.sessions.logout(&token).await;
    record(&state.telemetry, "logout", &result);
    result?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

pub(crate) async fn profile(
    State(state): State<Arc<ApiState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state.sessions.profile(&principal.identity).await?;
    Ok(Json(profile.into()))
}

pub(crate) async fn change_password(
    State(state): State<Arc<ApiState>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let result = state
        .sessions
        .change_password(
            &principal.identity,
            PasswordChange {
                current: request.current_password,
                replacement: request.new_password,
            },
        )
        .await;
    record(&state.telemetry, "change_password", &result);
    result?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn admin(
    Extension(principal): Extension<Principal>,
) -> Json<MessageResponse> {
    tracing::info!(identity = %principal.identity, "admin route accessed");
    Json(MessageResponse::new("Admin route accessed successfully"))
}
