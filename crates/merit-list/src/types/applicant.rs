//! Applicants and merit list entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::exam::ExamType;
use super::record::Record;

/// Applicant submission as received from the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplicant {
    pub application_id: String,
    pub name: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub preferred_branch: String,
    #[serde(default)]
    pub email: String,
}

/// A stored applicant. Never updated after submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub id: Uuid,
    pub application_id: String,
    pub name: String,
    pub contact_number: String,
    pub preferred_branch: String,
    pub email: String,
    pub submitted_at: DateTime<Utc>,
}

impl Applicant {
    pub fn from_submission(new: NewApplicant) -> Self {
        Self {
            id: Uuid::new_v4(),
            application_id: new.application_id,
            name: new.name,
            contact_number: new.contact_number,
            preferred_branch: new.preferred_branch,
            email: new.email,
            submitted_at: Utc::now(),
        }
    }
}

/// A raw exam row promoted into a merit list, tagged with its exam type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeritListEntry {
    #[serde(flatten)]
    pub record: Record,
    #[serde(rename = "examType")]
    pub exam_type: ExamType,
}

/// Dedup boundary of a merit list: exact application id, case-folded name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey(String);

impl EntryKey {
    pub fn new(application_id: &str, name: &str) -> Self {
        Self(format!("{}\u{1f}{}", application_id, name.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
