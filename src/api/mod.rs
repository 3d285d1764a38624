//! HTTP API
//!
//! Provides:
//! - Session open/close (id travels in the `x-session-id` header)
//! - Sign-in, sign-out and auth status
//! - Catalog list/search/detail for everyone
//! - Add/edit/delete for the admin
//! - Objects held by the memory storage backend under `/storage`

pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts},
    http::{header::CONTENT_TYPE, request::Parts, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, warn};

use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::error::ArchiveError;
use crate::session::{Session, SessionRegistry};
use crate::upload::{ImageUploader, MemoryObjectStore};

pub const SESSION_HEADER: &str = "x-session-id";

/// Room for the draft's text fields next to the encoded images
const BODY_SLACK_BYTES: usize = 64 * 1024;

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub uploader: ImageUploader,
    pub provider: Arc<dyn IdentityProvider>,
    /// Set when screenshots live in process and are served by `/storage`
    pub memory_store: Option<Arc<MemoryObjectStore>>,
}

/// Largest add/edit body: two base64-encoded images plus the draft
pub fn request_body_limit(max_image_bytes: usize) -> usize {
    let encoded_image = max_image_bytes.div_ceil(3).saturating_mul(4);
    encoded_image
        .saturating_mul(2)
        .saturating_add(BODY_SLACK_BYTES)
}

/// Create the API router
pub fn create_router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/api/sessions",
            post(routes::open_session).delete(routes::close_session),
        )
        .route("/api/auth", get(routes::auth_status))
        .route("/api/auth/sign-in", post(routes::sign_in))
        .route("/api/auth/sign-out", post(routes::sign_out))
        .route(
            "/api/videos",
            get(routes::list_videos).post(routes::create_video),
        )
        .route(
            "/api/videos/:id",
            get(routes::get_video)
                .put(routes::update_video)
                .delete(routes::delete_video),
        )
        .route("/storage/:bucket/*path", get(routes::get_object))
        .layer(DefaultBodyLimit::max(request_body_limit(
            config.storage.max_image_bytes,
        )))
        .layer(cors_layer(&config.server.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(SESSION_HEADER)])
        .max_age(Duration::from_secs(60 * 60));

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// The session named by the `x-session-id` header
pub struct CurrentSession(pub Arc<Session>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ArchiveError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ArchiveError::Session(format!("missing {} header", SESSION_HEADER)))?;

        state.registry.get(id).map(CurrentSession)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ArchiveError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ArchiveError::Validation(_) => StatusCode::BAD_REQUEST,
            ArchiveError::Auth(_) | ArchiveError::Session(_) => StatusCode::UNAUTHORIZED,
            ArchiveError::AdminRequired => StatusCode::FORBIDDEN,
            ArchiveError::NotFound(_) => StatusCode::NOT_FOUND,
            ArchiveError::Busy => StatusCode::CONFLICT,
            ArchiveError::Upload(_) => StatusCode::BAD_GATEWAY,
            ArchiveError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ArchiveError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
