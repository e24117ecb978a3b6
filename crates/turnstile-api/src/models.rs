//! Wire types exchanged over the HTTP surface.
//!
//! Request bodies default missing fields to empty so the session manager,
//! not the JSON extractor, reports which field is absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use turnstile_auth::{Profile, Role, TokenPair};
use turnstile_outbound::StoredUpload;
use turnstile_telemetry::MetricsSnapshot;
use turnstile_todo::{DEFAULT_LIMIT, DEFAULT_PAGE, SortOrder, TodoQuery};

/// RFC 9457 problem document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    /// URI reference identifying the problem type.
    pub kind: String,
    /// Short, human-readable summary of the issue.
    pub title: String,
    /// HTTP status code associated with the error.
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Detailed diagnostic message when available.
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Parameters that failed validation, if applicable.
    pub invalid_params: Option<Vec<ProblemInvalidParam>>,
}

/// Invalid parameter pointer surfaced alongside a [`ProblemDetails`] payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemInvalidParam {
    /// JSON Pointer to the offending field.
    pub pointer: String,
    /// Human-readable description of the validation failure.
    pub message: String,
}

/// `POST /signup` body.
#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignupRequest {
    /// Requested username.
    pub username: String,
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Optional elevation code.
    pub admin_code: Option<String>,
}

/// `POST /signup` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignupResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Registered username.
    pub username: String,
    /// Granted role.
    pub role: Role,
}

/// `POST /login` body.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Token pair returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Bearer token for protected routes.
    pub access_token: String,
    /// Single-use token for `/refresh` and `/logout`.
    pub refresh_token: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry.
    pub refresh_expires_at: DateTime<Utc>,
}

impl TokenResponse {
    pub(crate) fn new(message: &str, pair: TokenPair) -> Self {
        Self {
            message: message.to_string(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            access_expires_at: pair.access_expires_at,
            refresh_expires_at: pair.refresh_expires_at,
        }
    }
}

/// `POST /refresh` and `POST /logout` body.
#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Refresh token from the last login or rotation.
    pub refresh_token: Option<String>,
}

impl RefreshRequest {
    pub(crate) fn into_token(self) -> Option<String> {
        self.refresh_token.filter(|token| !token.trim().is_empty())
    }
}

/// Generic acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// `GET /profile` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// Username.
    pub username: String,
    /// Login email.
    pub email: String,
    /// Granted role.
    pub role: Role,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            username: profile.identity,
            email: profile.email,
            role: profile.role,
            created_at: profile.created_at,
        }
    }
}

/// `PUT /profile/password` body.
#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Password currently on record.
    pub current_password: String,
    /// Replacement password.
    pub new_password: String,
}

/// `POST /upload` body; `content` is base64.
#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadRequest {
    /// Client-side file name.
    pub file_name: String,
    /// Declared media type.
    pub content_type: Option<String>,
    /// Base64 (standard alphabet) file contents.
    pub content: String,
}

/// `POST /upload` response.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Where the file was stored.
    pub file: StoredUpload,
}

impl UploadResponse {
    pub(crate) fn new(message: &str, file: StoredUpload) -> Self {
        Self {
            message: message.to_string(),
            file,
        }
    }
}

/// `GET /todos` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoListParams {
    /// Completion filter.
    pub completed: Option<bool>,
    /// Creation-time ordering.
    pub sort: Option<SortOrder>,
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
}

impl From<TodoListParams> for TodoQuery {
    fn from(params: TodoListParams) -> Self {
        Self {
            completed: params.completed,
            sort: params.sort.unwrap_or_default(),
            page: params.page.unwrap_or(DEFAULT_PAGE),
            limit: params.limit.unwrap_or(DEFAULT_LIMIT),
        }
    }
}

/// `GET /health` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// Build identifier.
    pub build: String,
    /// Successful logins since start.
    pub logins_total: u64,
    /// Rejected logins since start.
    pub login_rejections_total: u64,
    /// Refresh rotations since start.
    pub refreshes_total: u64,
}

impl HealthResponse {
    pub(crate) fn new(build: &str, snapshot: &MetricsSnapshot) -> Self {
        Self {
            status: "ok".to_string(),
            build: build.to_string(),
            logins_total: snapshot.logins_total,
            login_rejections_total: snapshot.login_rejections_total,
            refreshes_total: snapshot.refreshes_total,
        }
    }
}
