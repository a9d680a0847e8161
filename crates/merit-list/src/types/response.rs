//! Response types for the HTTP surface

use serde::Serialize;

use super::applicant::Applicant;
use super::record::Record;

/// Result of an uploaded document run through the ingestion pipeline
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub collection_name: String,
    pub record_count: usize,
}

/// Accepted applicant submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub message: String,
    pub applicant: Applicant,
}

/// Sorted (and possibly filtered) merit list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeritListResponse {
    pub exam_type: String,
    pub category: Option<String>,
    pub merit_list_data: Vec<Record>,
}

/// Number of entries promoted into a merit list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    pub collection_name: String,
    pub student_count: usize,
}
