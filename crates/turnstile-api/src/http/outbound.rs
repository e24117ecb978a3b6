//! Mail and upload handlers; both act on behalf of the bearer.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, State},
};
use base64::{Engine as _, engine::general_purpose};
use turnstile_auth::Principal;
use turnstile_outbound::{OutgoingMail, Upload};

use crate::http::errors::ApiError;
use crate::models::{MessageResponse, UploadRequest, UploadResponse};
use crate::state::ApiState;

pub(crate) async fn send_email(
    State(state): State<Arc<ApiState>>,
    Extension(principal): Extension<Principal>,
    Json(mail): Json<OutgoingMail>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .outbound
        .send_mail(&principal.identity, mail)
        .await?;
    Ok(Json(MessageResponse::new("Email sent successfully")))
}

pub(crate) async fn upload(
    State(state): State<Arc<ApiState>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    let bytes = general_purpose::STANDARD
        .decode(request.content.trim())
        .map_err(|_| ApiError::bad_request("file content must be base64 encoded"))?;
    let stored = state
        .outbound
        .store_upload(
            &principal.identity,
            Upload {
                original_name: request.file_name,
                content_type: request.content_type,
                bytes,
            },
        )
        .await?;
    Ok(Json(UploadResponse::new("File uploaded successfully", stored)))
}
