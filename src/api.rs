//! HTTP surface for the admin editor and the landing page.

use crate::models::ConfigDocument;
use crate::store::DocumentStore;
use crate::upload::AssetUploader;
use crate::Error;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const UPLOAD_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub uploader: Arc<dyn AssetUploader>,
}

/// Build the API router. When `upload_dir` is given, its files are served
/// under `/uploads`.
pub fn build_router(state: AppState, upload_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/api/data", get(get_data).post(save_data))
        .route(
            "/api/upload",
            post(upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state);

    if let Some(dir) = upload_dir {
        app = app.nest_service("/uploads", ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::NoFile => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error body for the write endpoints: `{success: false, error}`.
fn failure(err: Error) -> Response {
    let status = status_for(&err);
    (
        status,
        Json(json!({ "success": false, "error": err.to_string() })),
    )
        .into_response()
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_data(State(state): State<AppState>) -> Response {
    match state.store.read().await {
        Ok(doc) => Json(doc).into_response(),
        Err(e) => {
            error!("Error fetching data: {}", e);
            (status_for(&e), Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

async fn save_data(
    State(state): State<AppState>,
    payload: Result<Json<ConfigDocument>, JsonRejection>,
) -> Response {
    let doc = match payload {
        Ok(Json(doc)) => doc,
        Err(rejection) => {
            error!("Rejected document body: {}", rejection.body_text());
            return failure(Error::MalformedDocument(rejection.body_text()));
        }
    };

    match state.store.write(&doc).await {
        Ok(()) => {
            info!("Document saved");
            Json(json!({ "success": true, "data": doc })).into_response()
        }
        Err(e) => {
            error!("Error saving data: {}", e);
            failure(e)
        }
    }
}

async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let Ok(mut multipart) = multipart else {
        return failure(Error::NoFile);
    };

    let (filename, bytes) = match next_file(&mut multipart).await {
        Ok(Some(file)) => file,
        Ok(None) => return failure(Error::NoFile),
        Err(e) => {
            error!("Error reading upload: {}", e);
            return failure(e);
        }
    };

    match state.uploader.store(&bytes, &filename).await {
        Ok(asset) => Json(json!({ "success": true, "url": asset.url })).into_response(),
        Err(e) => {
            error!("Error uploading file: {}", e);
            failure(e)
        }
    }
}

/// First part named `file` that carries a filename; plain text fields with
/// that name do not count as a file.
async fn next_file(multipart: &mut Multipart) -> crate::Result<Option<(String, Vec<u8>)>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::upload(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::upload(e.body_text()))?;
        return Ok(Some((filename, bytes.to_vec())));
    }

    Ok(None)
}
