//! The HTTP surface: backup endpoints, the JSON document store, photo
//! assets, and a health check. Runs on a trusted local network, so there is
//! no authentication; CORS is wide open for the kiosk front end.

pub mod backups;
pub mod documents;
pub mod photos;

use crate::storage::error::Error;
use crate::storage::scheduler::BackupService;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BackupService>,
    pub data_dir: PathBuf,
    pub photos_dir: PathBuf,
}

/// Renders storage errors as the `{ success: false, error }` envelope every
/// endpoint uses for failures.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::UnsafeFileName(_) => StatusCode::FORBIDDEN,
            Error::UnknownBackup(_) | Error::UnknownDocument(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!("request failed ({status}): {}", self.0);

        let body = Json(json!({ "success": false, "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

pub fn router(state: AppState) -> Router {
    let photos_dir = state.photos_dir.clone();

    Router::new()
        .route("/api/health", get(documents::health))
        .route("/api/data", get(documents::read_all))
        .route("/api/backup", post(backups::trigger_backup))
        .route("/api/backups", get(backups::list_backups))
        .route(
            "/api/backups/{filename}",
            get(backups::download_backup).delete(backups::delete_backup),
        )
        .route(
            "/api/photos",
            get(photos::list_photos).post(photos::upload_photo),
        )
        .route("/api/photos/{filename}", delete(photos::delete_photo))
        .route(
            "/api/{doc}",
            get(documents::read_doc).post(documents::write_doc),
        )
        .nest_service("/photos", ServeDir::new(photos_dir))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
