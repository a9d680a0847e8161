//! Cross-collection applicant lookup and merit list promotion

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::storage::{Collection, CollectionRegistry};
use crate::types::{CollectionName, EntryKey, ExamType, MeritListEntry, Record};

/// Matcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Make the merit list dedup check and insert a single store operation.
    /// When off, two simultaneous identical matches can both insert.
    #[serde(default = "default_enforce_unique")]
    pub enforce_unique_entries: bool,
}

fn default_enforce_unique() -> bool {
    true
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            enforce_unique_entries: default_enforce_unique(),
        }
    }
}

/// Finds an applicant in the raw exam collections and promotes each hit
/// into that exam's merit list
pub struct ApplicantMatcher {
    registry: Arc<CollectionRegistry>,
    config: MatcherConfig,
}

impl ApplicantMatcher {
    pub fn new(registry: Arc<CollectionRegistry>, config: MatcherConfig) -> Self {
        Self { registry, config }
    }

    /// Scan every exam type in fixed order for a row with this application id
    /// and (case-insensitively) this full name.
    ///
    /// Every hit is returned tagged with its exam type, whether or not it was
    /// already in the merit list.
    pub async fn find_and_promote(
        &self,
        application_id: &str,
        name: &str,
    ) -> Result<Vec<MeritListEntry>> {
        if application_id.trim().is_empty() || name.trim().is_empty() {
            return Err(Error::validation("Application ID and name are required"));
        }

        let mut results = Vec::new();
        for exam_type in ExamType::ALL {
            let raw = CollectionName::raw(exam_type);
            if !self.registry.exists(raw).await? {
                tracing::debug!("No {} collection, skipping", raw);
                continue;
            }

            let collection = self.registry.get(raw).await?;
            let Some(record) = find_applicant(&collection, application_id, name).await? else {
                continue;
            };
            tracing::info!("Found applicant {} in {}", application_id, raw);

            self.promote(exam_type, application_id, name, &record).await?;
            results.push(MeritListEntry { record, exam_type });
        }

        if results.is_empty() {
            return Err(Error::not_found(format!(
                "No record found for application {} in any collection",
                application_id
            )));
        }
        Ok(results)
    }

    async fn promote(
        &self,
        exam_type: ExamType,
        application_id: &str,
        name: &str,
        record: &Record,
    ) -> Result<()> {
        let merit_list = self
            .registry
            .ensure(CollectionName::merit_list(exam_type))
            .await?;
        let key = EntryKey::new(application_id, name);

        let inserted = if self.config.enforce_unique_entries {
            merit_list.insert_entry_if_absent(&key, record).await?
        } else if merit_list.contains_entry(&key).await? {
            false
        } else {
            merit_list.insert_entry(&key, record).await?;
            true
        };

        if inserted {
            tracing::info!("Promoted {} into {}", application_id, merit_list.as_str());
        } else {
            tracing::debug!("{} already in {}, skipped", application_id, merit_list.as_str());
        }
        Ok(())
    }
}

/// First row with an exact id and a case-insensitively equal full name
async fn find_applicant(
    collection: &Collection,
    application_id: &str,
    name: &str,
) -> Result<Option<Record>> {
    let fields = collection.exam_type().fields();
    let wanted = name.to_lowercase();

    let candidates = collection
        .find_by_field(fields.application_id, application_id)
        .await?;
    Ok(candidates.into_iter().find(|record| {
        record
            .get(fields.full_name)
            .and_then(|v| v.as_str())
            .is_some_and(|n| n.to_lowercase() == wanted)
    }))
}
