//! Record store provider trait for schema-less collections

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Applicant, EntryKey, ExamType, Record};

/// Trait for the document store that holds exam and merit list collections
///
/// Implementations:
/// - `SqliteRecordStore`: local SQLite database
#[async_trait]
pub trait RecordStoreProvider: Send + Sync {
    /// Check whether a collection exists
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Create a collection
    ///
    /// Returns `Error::CollectionExists` when the name is already taken.
    async fn create_collection(&self, name: &str) -> Result<()>;

    /// List collection names
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Bulk insert records, returning the number inserted
    async fn insert_records(&self, collection: &str, records: &[Record]) -> Result<usize>;

    /// All records of a collection in insertion order
    async fn find_all(&self, collection: &str) -> Result<Vec<Record>>;

    /// Records whose text field equals `value` exactly
    async fn find_by_field(&self, collection: &str, field: &str, value: &str)
        -> Result<Vec<Record>>;

    /// First record of a collection, used as a field sample
    async fn first(&self, collection: &str) -> Result<Option<Record>>;

    /// Number of records in a collection
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Check for an entry with the given dedup key
    async fn contains_entry(&self, collection: &str, key: &EntryKey) -> Result<bool>;

    /// Insert a keyed entry without checking for duplicates
    async fn insert_entry(
        &self,
        collection: &str,
        key: &EntryKey,
        exam_type: ExamType,
        record: &Record,
    ) -> Result<()>;

    /// Insert a keyed entry only if the key is absent, atomically.
    /// Returns whether a write happened.
    async fn insert_entry_if_absent(
        &self,
        collection: &str,
        key: &EntryKey,
        exam_type: ExamType,
        record: &Record,
    ) -> Result<bool>;

    /// Store an applicant submission
    async fn insert_applicant(&self, applicant: &Applicant) -> Result<()>;

    /// Applicants submitted under an application id
    async fn applicants_by_application_id(&self, application_id: &str) -> Result<Vec<Applicant>>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
