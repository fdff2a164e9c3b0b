//! File upload endpoint.
//!
//! Accepts one multipart `file` field, gates it (extension and size)
//! before any worker is spawned, writes it to the upload directory and
//! hands the path to an isolated ingestion worker. The temp file is
//! deleted after the run regardless of outcome.

use axum::{
    extract::{Multipart, State},
    Json,
};
use policy_core::limits;
use telemetry::metrics;
use tracing::{info, warn};
use uuid::Uuid;

use crate::response::{ApiError, UploadResponse};
use crate::state::AppState;

/// POST /api/upload
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file_name: Option<String> = None;
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        file_name = field.file_name().map(|n| n.to_string());
        file_data = Some(
            field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Read error: {}", e)))?
                .to_vec(),
        );
    }

    let data = file_data.ok_or_else(|| {
        metrics().uploads_rejected.inc();
        ApiError::bad_request("No file uploaded")
    })?;
    let name = file_name.unwrap_or_else(|| "upload".to_string());

    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !limits::ALLOWED_UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
        metrics().uploads_rejected.inc();
        warn!(file = %name, "rejected upload with unsupported extension");
        return Err(ApiError::bad_request(
            "Only CSV and XLSX files are allowed",
        ));
    }

    if data.len() > limits::MAX_UPLOAD_SIZE_BYTES {
        metrics().uploads_rejected.inc();
        warn!(file = %name, size = data.len(), "rejected oversized upload");
        return Err(ApiError::bad_request("File size exceeds the 10MB limit"));
    }

    metrics().uploads_received.inc();

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| ApiError::internal("Error processing file", e.to_string()))?;
    let temp_path = state.upload_dir.join(format!("{}-{}", Uuid::new_v4(), name));
    tokio::fs::write(&temp_path, &data)
        .await
        .map_err(|e| ApiError::internal("Error processing file", e.to_string()))?;

    info!(file = %name, size = data.len(), "dispatching upload to ingestion worker");
    let outcome = worker::dispatch(&state.store, temp_path.clone(), state.worker_timeout).await;

    // Temp file cleanup happens on every path, including worker timeout.
    if let Err(e) = tokio::fs::remove_file(&temp_path).await {
        warn!(path = %temp_path.display(), error = %e, "failed to delete temp upload");
    }

    match outcome {
        Ok(summary) => Ok(Json(UploadResponse::new(summary))),
        Err(e) => Err(ApiError::internal("Error processing file", e.to_string())),
    }
}
