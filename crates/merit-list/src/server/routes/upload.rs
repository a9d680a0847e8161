//! Result document upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::UploadResponse;

/// POST /api/upload - multipart `pdf` file plus `collectionName` exam tag
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut document: Option<(String, Vec<u8>)> = None;
    let mut exam_tag: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "collectionName" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::validation(format!("Failed to read collectionName: {}", e)))?;
                exam_tag = Some(text.trim().to_string());
            }
            "pdf" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "upload.pdf".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::validation(format!("Failed to read {}: {}", filename, e)))?;
                document = Some((filename, data.to_vec()));
            }
            other => tracing::debug!("Ignoring multipart field {}", other),
        }
    }

    let exam_tag = exam_tag.ok_or_else(|| Error::validation("collectionName is required"))?;
    let (filename, data) = document.ok_or_else(|| Error::validation("pdf file is required"))?;
    tracing::info!("Upload {} ({} bytes) for {}", filename, data.len(), exam_tag);

    let report = state
        .pipeline()
        .ingest_upload(&filename, &data, &exam_tag)
        .await
        .inspect_err(|e| tracing::error!("Ingestion of {} failed: {}", filename, e))?;

    Ok(Json(UploadResponse {
        message: "File processed and data inserted successfully.".to_string(),
        collection_name: report.collection,
        record_count: report.record_count,
    }))
}
