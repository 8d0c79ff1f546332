//! Photo asset endpoints. Uploads arrive as base64 payloads from the
//! dashboard; the files themselves are served statically under `/photos`.

use crate::http::{ApiResult, AppState};
use crate::storage::error::Error;
use crate::storage::validate::safe_file_name;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use serde_with::base64::Base64;
use serde_with::As;
use tracing::info;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

fn is_image_name(name: &str) -> bool {
    std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Handles `GET /api/photos`, listing image files as `/photos/<name>` URLs.
pub async fn list_photos(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let dir = state.photos_dir.clone();
    let names = tokio::task::spawn_blocking(move || -> crate::storage::error::Result<Vec<String>> {
        std::fs::create_dir_all(&dir).map_err(|source| Error::Directory {
            path: dir.clone(),
            source,
        })?;
        let mut names: Vec<String> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_image_name(name))
            .collect();
        names.sort_unstable();
        Ok(names)
    })
    .await
    .map_err(|e| Error::Io(std::io::Error::other(e)))??;

    let urls: Vec<String> = names.into_iter().map(|n| format!("/photos/{n}")).collect();
    Ok(Json(json!({ "success": true, "data": urls })))
}

#[derive(Debug, Deserialize)]
pub struct PhotoUpload {
    filename: String,
    #[serde(with = "As::<Base64>")]
    data: Vec<u8>,
}

/// `POST /api/photos`
pub async fn upload_photo(
    State(state): State<AppState>,
    Json(body): Json<PhotoUpload>,
) -> ApiResult<Json<Value>> {
    safe_file_name(&body.filename)?;

    tokio::fs::create_dir_all(&state.photos_dir)
        .await
        .map_err(|source| Error::Directory {
            path: state.photos_dir.clone(),
            source,
        })?;
    let path = state.photos_dir.join(&body.filename);
    tokio::fs::write(&path, &body.data)
        .await
        .map_err(Error::from)?;
    info!("stored photo {} ({} bytes)", body.filename, body.data.len());

    Ok(Json(json!({
        "success": true,
        "url": format!("/photos/{}", body.filename)
    })))
}

/// `DELETE /api/photos/{filename}`
pub async fn delete_photo(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Json<Value>> {
    safe_file_name(&filename)?;

    let path = state.photos_dir.join(&filename);
    tokio::fs::remove_file(&path).await.map_err(Error::from)?;

    Ok(Json(json!({ "success": true, "message": "Photo deleted" })))
}
