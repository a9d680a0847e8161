//! Merit list query, download and count endpoints

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{
    CollectionName, CountResponse, DownloadRequest, ExamType, MeritListRequest, MeritListResponse,
};

/// POST /api/merit-list - sorted, optionally category-filtered merit list
pub async fn get_merit_list(
    State(state): State<AppState>,
    Json(request): Json<MeritListRequest>,
) -> Result<Json<MeritListResponse>> {
    let records = state
        .query()
        .query(&request.exam_type, request.category_filter())
        .await?;

    Ok(Json(MeritListResponse {
        exam_type: request.exam_type.clone(),
        category: request.category_filter().map(str::to_string),
        merit_list_data: records,
    }))
}

/// POST /api/merit-list/download - merit list as a CSV attachment
pub async fn download_merit_list(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Result<Response> {
    let export = state
        .exporter()
        .export(&request.exam_type, &request.selected_columns)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", export.filename),
            ),
        ],
        export.bytes,
    )
        .into_response())
}

/// GET /api/merit-list/:exam_type/count - applicants promoted so far
pub async fn count_registered(
    State(state): State<AppState>,
    Path(exam_type): Path<String>,
) -> Result<Json<CountResponse>> {
    let student_count = state.query().count(&exam_type).await?;
    let exam_type: ExamType = exam_type.parse()?;

    Ok(Json(CountResponse {
        collection_name: CollectionName::merit_list(exam_type).to_string(),
        student_count,
    }))
}
