mod auth;
mod content;
mod posts;
mod users;

pub use auth::AuthUser;

use crate::auth::TokenSigner;
use crate::config::FlqweenConfig;
use crate::content::ContentService;
use crate::database::Database;
use crate::error::ServiceError;
use crate::files::{UploadStore, PUBLIC_PREFIX};
use crate::posts::PostService;
use crate::social::FollowService;
use crate::users::UserService;
use anyhow::Result;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, FromRequest};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: FlqweenConfig,
    pub tokens: TokenSigner,
    pub users: UserService,
    pub content: ContentService,
    pub posts: PostService,
    pub follows: FollowService,
}

impl AppState {
    pub fn new(config: FlqweenConfig, database: Database, tokens: TokenSigner) -> Self {
        let store = UploadStore::new(&config.paths);
        Self {
            users: UserService::new(database.clone(), tokens.clone()),
            content: ContentService::new(database.clone(), store),
            posts: PostService::new(database.clone()),
            follows: FollowService::new(database),
            tokens,
            config,
        }
    }
}

pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl ApiError {
    fn into_response_parts(self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse { error: msg }),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ErrorResponse { error: msg }),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse { error: msg }),
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "internal server error".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_response_parts();
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::BadRequest(msg) => ApiError::BadRequest(msg),
            // A duplicate email is reported as a plain bad request.
            ServiceError::Conflict(msg) => ApiError::BadRequest(msg),
            ServiceError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Storage(err) => ApiError::Internal(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// `Json` extractor whose rejections use the `{"error": ...}` envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub(crate) struct JsonBody<T>(pub T);

#[derive(Debug, Serialize)]
pub(crate) struct OkResponse {
    ok: bool,
}

impl OkResponse {
    pub(crate) fn ok() -> Self {
        Self { ok: true }
    }
}

async fn health_handler() -> &'static str {
    "OK"
}

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.file.max_upload_bytes;
    let uploads = ServeDir::new(&state.config.paths.uploads_dir);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/register", post(users::register))
        .route("/api/login", post(users::login))
        .route(
            "/api/profile/:id",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/api/users", get(users::list_users))
        .route("/api/users/:id/follow", post(users::follow_user))
        .route(
            "/api/content",
            get(content::list_content).post(content::upload_content),
        )
        .route("/api/content/:id/like", post(content::like_content))
        .route("/api/posts", get(posts::list_posts).post(posts::create_post))
        .nest_service(PUBLIC_PREFIX, uploads)
        .layer(DefaultBodyLimit::max(
            usize::try_from(max_upload_bytes).unwrap_or(usize::MAX),
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Tries to bind to the given port, or finds the next available port
async fn find_available_port(start_port: u16) -> Result<(TcpListener, u16)> {
    const MAX_PORT_ATTEMPTS: u16 = 100;

    for offset in 0..MAX_PORT_ATTEMPTS {
        let Some(port) = start_port.checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => {
                if offset == 0 {
                    tracing::debug!(port, error = %e, "port in use, trying next port");
                }
                continue;
            }
        }
    }

    anyhow::bail!(
        "could not find available port starting at {}",
        start_port
    )
}

pub async fn serve_http(config: FlqweenConfig, database: Database, tokens: TokenSigner) -> Result<()> {
    let requested_port = config.api_port;
    let (listener, actual_port) = find_available_port(requested_port).await?;

    if actual_port != requested_port {
        tracing::warn!(
            requested_port,
            actual_port,
            "configured port was in use, bound to next available port"
        );
    }

    serve_listener(listener, config, database, tokens).await
}

/// Serves the API on an already bound listener.
pub async fn serve_listener(
    listener: TcpListener,
    config: FlqweenConfig,
    database: Database,
    tokens: TokenSigner,
) -> Result<()> {
    let max_upload_bytes = config.file.max_upload_bytes;
    let router = build_router(AppState::new(config, database, tokens));

    tracing::info!(
        max_body_limit_mb = max_upload_bytes / (1024 * 1024),
        "configured upload body limit"
    );

    let addr = listener.local_addr()?;
    tracing::info!(?addr, "HTTP server listening");
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn busy_port_falls_through_to_next_free_one() {
        let taken = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], 0)))
            .await
            .expect("bind ephemeral port");
        let busy = taken.local_addr().unwrap().port();

        let (listener, port) = find_available_port(busy).await.expect("free port");
        assert_ne!(port, busy);
        assert_eq!(listener.local_addr().unwrap().port(), port);
    }
}
