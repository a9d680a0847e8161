//! Applicant submission and lookup endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{LookupRequest, MeritListEntry, NewApplicant, SubmitResponse};

/// POST /api/applicants - store an applicant submission
pub async fn submit_application(
    State(state): State<AppState>,
    Json(request): Json<NewApplicant>,
) -> Result<Json<SubmitResponse>> {
    let applicant = state.applicants().submit(request).await?;
    Ok(Json(SubmitResponse {
        message: "Application submitted successfully!".to_string(),
        applicant,
    }))
}

/// POST /api/applications/lookup - find the applicant in every exam and
/// promote the hits into the merit lists
pub async fn lookup_application(
    State(state): State<AppState>,
    Json(request): Json<LookupRequest>,
) -> Result<Json<Vec<MeritListEntry>>> {
    let entries = state
        .matcher()
        .find_and_promote(&request.application_id, &request.name)
        .await?;
    Ok(Json(entries))
}
