//! Applicant submissions

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::RecordStoreProvider;
use crate::types::{Applicant, NewApplicant};

/// Stores applicant identity submissions for later matching
pub struct ApplicantService {
    store: Arc<dyn RecordStoreProvider>,
}

impl ApplicantService {
    pub fn new(store: Arc<dyn RecordStoreProvider>) -> Self {
        Self { store }
    }

    /// Validate and store a submission. Stored applicants are never updated.
    pub async fn submit(&self, submission: NewApplicant) -> Result<Applicant> {
        if submission.application_id.trim().is_empty() {
            return Err(Error::validation("Application ID is required"));
        }
        if submission.name.trim().is_empty() {
            return Err(Error::validation("Name is required"));
        }

        let applicant = Applicant::from_submission(submission);
        self.store.insert_applicant(&applicant).await?;
        tracing::info!(
            "Stored application {} ({})",
            applicant.application_id,
            applicant.id
        );
        Ok(applicant)
    }

    /// Submissions made under an application id, oldest first
    pub async fn by_application_id(&self, application_id: &str) -> Result<Vec<Applicant>> {
        self.store.applicants_by_application_id(application_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SqliteRecordStore;

    fn service() -> ApplicantService {
        ApplicantService::new(Arc::new(SqliteRecordStore::in_memory().unwrap()))
    }

    fn submission(application_id: &str, name: &str) -> NewApplicant {
        NewApplicant {
            application_id: application_id.to_string(),
            name: name.to_string(),
            contact_number: "9800000000".to_string(),
            preferred_branch: "Computer Engineering".to_string(),
            email: "riya@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_stores_applicant() {
        let service = service();
        let applicant = service.submit(submission("EN001", "Riya Patil")).await.unwrap();

        let stored = service.by_application_id("EN001").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, applicant.id);
        assert_eq!(stored[0].preferred_branch, "Computer Engineering");
    }

    #[tokio::test]
    async fn test_resubmission_adds_a_row() {
        let service = service();
        service.submit(submission("EN001", "Riya Patil")).await.unwrap();
        service.submit(submission("EN001", "Riya Patil")).await.unwrap();
        assert_eq!(service.by_application_id("EN001").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_identity_rejected() {
        let service = service();
        assert!(matches!(
            service.submit(submission(" ", "Riya Patil")).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            service.submit(submission("EN001", "")).await,
            Err(Error::Validation(_))
        ));
        assert!(service.by_application_id("EN001").await.unwrap().is_empty());
    }
}
