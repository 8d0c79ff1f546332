//! Generic JSON document endpoints plus the health check.
//!
//! The backup routes are registered before the `{doc}` catch-all, so a
//! document can never shadow them.

use crate::http::{ApiError, ApiResult, AppState};
use crate::storage::documents;
use crate::storage::error::Error;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "healthy",
        "dataDir": state.data_dir,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Handles `GET /api/data`, bundling the dashboard's core documents into
/// one response. Missing documents come back as their empty value rather
/// than failing the whole aggregate.
pub async fn read_all(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let data_dir = state.data_dir.clone();
    let data =
        tokio::task::spawn_blocking(move || -> crate::storage::error::Result<Value> {
            let read = |name: &str, empty: Value| -> crate::storage::error::Result<Value> {
                Ok(documents::read_document(&data_dir, name)?.unwrap_or(empty))
            };
            Ok(json!({
                "tasks": read("tasks", json!([]))?,
                "rewards": read("rewards", json!([]))?,
                "userPoints": read("userPoints", json!({}))?,
                "apiKeys": read("apiKeys", json!({}))?,
            }))
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))??;

    Ok(Json(json!({ "success": true, "data": data })))
}

/// `GET /api/{doc}`
pub async fn read_doc(
    State(state): State<AppState>,
    Path(doc): Path<String>,
) -> ApiResult<Json<Value>> {
    let data_dir = state.data_dir.clone();
    let name = doc.clone();
    let data = tokio::task::spawn_blocking(move || documents::read_document(&data_dir, &name))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))??;

    match data {
        Some(data) => Ok(Json(json!({ "success": true, "data": data }))),
        None => Err(Error::UnknownDocument(doc).into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct WriteDocumentRequest {
    data: Option<Value>,
}

/// `POST /api/{doc}`
pub async fn write_doc(
    State(state): State<AppState>,
    Path(doc): Path<String>,
    Json(body): Json<WriteDocumentRequest>,
) -> Response {
    let Some(data) = body.data else {
        let body = Json(json!({ "success": false, "error": "No data provided" }));
        return (StatusCode::BAD_REQUEST, body).into_response();
    };

    let data_dir = state.data_dir.clone();
    let name = doc.clone();
    let result =
        tokio::task::spawn_blocking(move || documents::write_document(&data_dir, &name, &data))
            .await;

    match result {
        Ok(Ok(())) => Json(json!({
            "success": true,
            "message": format!("{doc} updated successfully")
        }))
        .into_response(),
        Ok(Err(e)) => ApiError(e).into_response(),
        Err(e) => ApiError(Error::Io(std::io::Error::other(e))).into_response(),
    }
}
