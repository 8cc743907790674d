//! HTTP upload service.
//!
//! Endpoints:
//! - GET / - liveness message
//! - POST /api/upload - multipart upload (field `file`), returns the extraction

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use pdfsift::render::{ErrorBody, UploadResponse};
use pdfsift::{validate_upload_name, Error, Extractor, TokenEncoding, MSG_NO_FILE_PART};

/// Text returned by `GET /`.
pub const BANNER: &str = "PDF extraction backend is running...";

/// Settings for `pdfsift serve`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_mb: usize,
    pub encoding: TokenEncoding,
}

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    extractor: Arc<Extractor>,
}

impl AppState {
    pub fn new(extractor: Extractor) -> Self {
        Self {
            extractor: Arc::new(extractor),
        }
    }
}

/// Error response: status code plus `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            body: ErrorBody::from_error(&err),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self {
            status: err.status(),
            body: ErrorBody::new(err.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/upload", post(upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until Ctrl+C.
pub async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let extractor = Extractor::new()
        .with_encoding(config.encoding)
        .with_parallel(true);
    let app = router(AppState::new(extractor), config.max_upload_mb * 1024 * 1024);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("pdfsift listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Received Ctrl+C, shutting down");
}

async fn index() -> &'static str {
    BANNER
}

/// POST /api/upload
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        // A part without a filename is a plain form value, not an upload.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        validate_upload_name(Some(filename.as_str()))?;

        let data = field.bytes().await?;
        log::debug!("Received {} ({} bytes)", filename, data.len());

        let extractor = Arc::clone(&state.extractor);
        let result = tokio::task::spawn_blocking(move || extractor.extract_bytes(data.to_vec()))
            .await
            .map_err(|e| Error::Extraction(format!("worker failed: {}", e)))??;

        return Ok(Json(UploadResponse::new(result)));
    }

    Err(Error::InvalidInput(MSG_NO_FILE_PART.to_string()).into())
}
