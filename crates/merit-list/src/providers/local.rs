//! Local provider implementation backed by SQLite
//!
//! Wraps the synchronous `RecordDb` and moves each call onto the blocking pool.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::storage::RecordDb;
use crate::types::{Applicant, EntryKey, ExamType, Record};

use super::record_store::RecordStoreProvider;

/// Local record store wrapping the SQLite database
pub struct SqliteRecordStore {
    db: Arc<RecordDb>,
}

impl SqliteRecordStore {
    /// Create from an existing database
    pub fn new(db: Arc<RecordDb>) -> Self {
        Self { db }
    }

    /// Open (or create) the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Arc::new(RecordDb::new(path)?)))
    }

    /// In-memory store (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(RecordDb::in_memory()?)))
    }

    /// RecordDb calls are sync, run them on the blocking pool
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&RecordDb) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl RecordStoreProvider for SqliteRecordStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let name = name.to_string();
        self.blocking(move |db| db.collection_exists(&name)).await
    }

    async fn create_collection(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        self.blocking(move |db| db.create_collection(&name)).await
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        self.blocking(|db| db.list_collections()).await
    }

    async fn insert_records(&self, collection: &str, records: &[Record]) -> Result<usize> {
        let collection = collection.to_string();
        let records = records.to_vec();
        self.blocking(move |db| db.insert_records(&collection, &records))
            .await
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Record>> {
        let collection = collection.to_string();
        self.blocking(move |db| db.find_all(&collection)).await
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Record>> {
        let (collection, field, value) =
            (collection.to_string(), field.to_string(), value.to_string());
        self.blocking(move |db| db.find_by_field(&collection, &field, &value))
            .await
    }

    async fn first(&self, collection: &str) -> Result<Option<Record>> {
        let collection = collection.to_string();
        self.blocking(move |db| db.first(&collection)).await
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collection = collection.to_string();
        self.blocking(move |db| db.count(&collection)).await
    }

    async fn contains_entry(&self, collection: &str, key: &EntryKey) -> Result<bool> {
        let (collection, key) = (collection.to_string(), key.clone());
        self.blocking(move |db| db.contains_entry(&collection, &key))
            .await
    }

    async fn insert_entry(
        &self,
        collection: &str,
        key: &EntryKey,
        exam_type: ExamType,
        record: &Record,
    ) -> Result<()> {
        let (collection, key, record) = (collection.to_string(), key.clone(), record.clone());
        self.blocking(move |db| db.insert_entry(&collection, &key, exam_type, &record))
            .await
    }

    async fn insert_entry_if_absent(
        &self,
        collection: &str,
        key: &EntryKey,
        exam_type: ExamType,
        record: &Record,
    ) -> Result<bool> {
        let (collection, key, record) = (collection.to_string(), key.clone(), record.clone());
        self.blocking(move |db| db.insert_entry_if_absent(&collection, &key, exam_type, &record))
            .await
    }

    async fn insert_applicant(&self, applicant: &Applicant) -> Result<()> {
        let applicant = applicant.clone();
        self.blocking(move |db| db.insert_applicant(&applicant)).await
    }

    async fn applicants_by_application_id(&self, application_id: &str) -> Result<Vec<Applicant>> {
        let application_id = application_id.to_string();
        self.blocking(move |db| db.applicants_by_application_id(&application_id))
            .await
    }

    async fn health_check(&self) -> Result<bool> {
        self.blocking(|db| db.get_stats().map(|_| true)).await
    }

    fn name(&self) -> &str {
        "local-sqlite"
    }
}
