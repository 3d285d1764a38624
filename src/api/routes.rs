//! API route handlers

use axum::{
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AppState, CurrentSession};
use crate::auth::{check_credentials, AuthStatus};
use crate::catalog::{VideoDraft, VideoEntry};
use crate::error::{ArchiveError, Result};
use crate::submit::{self, EntryForm};
use crate::upload::ImagePayload;

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    "OK"
}

// === Sessions ===

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
}

/// POST /api/sessions
pub async fn open_session(State(state): State<AppState>) -> (StatusCode, Json<SessionResponse>) {
    let (session_id, _) = state.registry.open();
    (StatusCode::CREATED, Json(SessionResponse { session_id }))
}

/// DELETE /api/sessions
pub async fn close_session(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<StatusCode> {
    state.registry.close(session.id())?;
    Ok(StatusCode::NO_CONTENT)
}

// === Auth ===

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// GET /api/auth
pub async fn auth_status(CurrentSession(session): CurrentSession) -> Json<AuthStatus> {
    Json(session.auth.read().await.status())
}

/// POST /api/auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<SignInRequest>,
) -> Result<Json<AuthStatus>> {
    // The gate is only locked once the provider has answered
    let outcome =
        check_credentials(state.provider.as_ref(), &request.email, &request.password).await;
    let status = session.auth.write().await.complete_sign_in(outcome)?;
    Ok(Json(status))
}

/// POST /api/auth/sign-out
pub async fn sign_out(CurrentSession(session): CurrentSession) -> Json<AuthStatus> {
    let mut auth = session.auth.write().await;
    auth.sign_out();
    Json(auth.status())
}

// === Videos ===

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Add/edit body: draft fields plus optional base64 screenshots
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoRequest {
    #[serde(flatten)]
    pub draft: VideoDraft,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_image_file: Option<ImagePayload>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_image_file: Option<ImagePayload>,
}

impl VideoRequest {
    fn into_form(self) -> Result<EntryForm> {
        Ok(EntryForm {
            draft: self.draft,
            primary_file: self.primary_image_file.map(ImagePayload::decode).transpose()?,
            secondary_file: self
                .secondary_image_file
                .map(ImagePayload::decode)
                .transpose()?,
        })
    }
}

/// GET /api/videos?q=
pub async fn list_videos(
    CurrentSession(session): CurrentSession,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<VideoEntry>> {
    let catalog = session.catalog.read().await;
    let entries = match query.q {
        Some(term) => {
            debug!(term = %term, "Searching catalog");
            catalog.search(&term)
        }
        None => catalog.list().to_vec(),
    };
    Json(entries)
}

/// GET /api/videos/:id
pub async fn get_video(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<VideoEntry>> {
    let catalog = session.catalog.read().await;
    Ok(Json(catalog.get(&id)?.clone()))
}

/// POST /api/videos
pub async fn create_video(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<VideoRequest>,
) -> Result<(StatusCode, Json<VideoEntry>)> {
    let form = request.into_form()?;
    let entry = submit::create(&session, &state.uploader, form).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /api/videos/:id
pub async fn update_video(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(request): Json<VideoRequest>,
) -> Result<Json<VideoEntry>> {
    let form = request.into_form()?;
    let entry = submit::edit(&session, &state.uploader, &id, form).await?;
    Ok(Json(entry))
}

/// DELETE /api/videos/:id
pub async fn delete_video(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<VideoEntry>> {
    let removed = submit::delete(&session, &id).await?;
    Ok(Json(removed))
}

// === Storage ===

/// GET /storage/:bucket/*path
///
/// Serves screenshots held by the memory backend.
pub async fn get_object(
    State(state): State<AppState>,
    Path((bucket, path)): Path<(String, String)>,
) -> Result<Response> {
    let not_found = || ArchiveError::NotFound(format!("object {}/{}", bucket, path));

    let store = state.memory_store.as_ref().ok_or_else(not_found)?;
    let (content_type, data) = store.get(&bucket, &path).await.ok_or_else(not_found)?;

    Ok(([(CONTENT_TYPE, content_type)], data).into_response())
}
