//! Backup endpoints: on-demand trigger, listing, download and delete.
//!
//! Download and delete take a client-supplied file name; anything that
//! could resolve outside the backup directory is rejected with 403 before
//! the filesystem is touched.

use crate::http::{ApiError, ApiResult, AppState};
use crate::storage::error::Error;
use crate::storage::retention;
use crate::storage::validate::safe_file_name;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio_util::io::ReaderStream;
use tracing::info;

const DEFAULT_MAX_BACKUPS: usize = 2;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerBackupRequest {
    max_backups: Option<usize>,
}

/// Handles `POST /api/backup` by running a backup cycle immediately.
pub async fn trigger_backup(
    State(state): State<AppState>,
    body: Option<Json<TriggerBackupRequest>>,
) -> ApiResult<Json<Value>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let max_backups = req.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);

    let outcome = state.service.run_backup(max_backups).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Backup created",
        "filename": outcome.archive.filename(),
        "path": outcome.archive.path(),
        "size": outcome.archive.size_bytes(),
    })))
}

/// Handles `GET /api/backups`, listing all archives newest first.
pub async fn list_backups(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let output_dir = state.service.output_dir().clone();
    let backups = tokio::task::spawn_blocking(move || retention::list_backups(&output_dir))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))??;

    Ok(Json(json!({ "success": true, "backups": backups })))
}

/// Handles `GET /api/backups/{filename}`, streaming one archive back as an
/// attachment without buffering it in memory.
pub async fn download_backup(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let path = archive_path(&state, &filename)?;

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::UnknownBackup(filename).into())
        }
        Err(e) => return Err(Error::from(e).into()),
    };

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/zip"),
    );
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);

    Ok(response)
}

/// Handles `DELETE /api/backups/{filename}`, removing one archive by name.
pub async fn delete_backup(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Json<Value>> {
    let path = archive_path(&state, &filename)?;

    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            info!("deleted backup {filename} by request");
            Ok(Json(json!({
                "success": true,
                "message": format!("Backup deleted: {filename}")
            })))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::UnknownBackup(filename).into()),
        Err(e) => Err(Error::from(e).into()),
    }
}

fn archive_path(state: &AppState, filename: &str) -> Result<PathBuf, ApiError> {
    safe_file_name(filename)?;
    Ok(state.service.output_dir().join(filename))
}
