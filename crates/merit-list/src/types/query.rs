//! Request types for lookups, merit list queries and exports

use serde::{Deserialize, Serialize};

/// Applicant lookup across all exam collections
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest {
    pub application_id: String,
    pub name: String,
}

/// Merit list query, optionally filtered by category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeritListRequest {
    pub exam_type: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl MeritListRequest {
    /// Category filter, treating an empty string as no filter
    pub fn category_filter(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }
}

/// Merit list CSV download
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub exam_type: String,
    /// Columns to project; all columns of the first record when empty
    #[serde(default)]
    pub selected_columns: Vec<String>,
}

/// Query parameters shared by the analytics endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsParams {
    /// Exam to aggregate; the configured default when absent
    #[serde(default)]
    pub exam_type: Option<String>,
}
