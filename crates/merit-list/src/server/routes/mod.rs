//! API routes for the merit list server

pub mod analytics;
pub mod applicants;
pub mod merit_list;
pub mod upload;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::ExamType;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Ingestion - with larger body limit for document uploads
        .route(
            "/upload",
            post(upload::upload_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Applicants
        .route("/applicants", post(applicants::submit_application))
        .route("/applications/lookup", post(applicants::lookup_application))
        // Merit lists
        .route("/merit-list", post(merit_list::get_merit_list))
        .route("/merit-list/download", post(merit_list::download_merit_list))
        .route("/merit-list/:exam_type/count", get(merit_list::count_registered))
        // Dashboard
        .route("/analytics/categories", get(analytics::category_distribution))
        .route("/analytics/scores", get(analytics::score_distribution))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let collections = state.registry().list().await?;
    Ok(Json(serde_json::json!({
        "name": "merit-list",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Exam result ingestion, applicant reconciliation and merit lists",
        "store": state.store().name(),
        "examTypes": ExamType::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
        "collections": collections,
        "endpoints": {
            "POST /api/upload": "Upload a result document (multipart: pdf, collectionName)",
            "POST /api/applicants": "Submit an applicant",
            "POST /api/applications/lookup": "Find an applicant and promote matches to merit lists",
            "POST /api/merit-list": "Sorted merit list, optionally filtered by category",
            "POST /api/merit-list/download": "Merit list as CSV",
            "GET /api/merit-list/:exam_type/count": "Number of promoted applicants",
            "GET /api/analytics/categories": "Merit list distribution by category",
            "GET /api/analytics/scores": "Score distribution of ingested rows"
        }
    })))
}
