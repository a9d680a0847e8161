//! Collection registry: idempotent creation and lookup of named collections

use dashmap::DashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::RecordStoreProvider;
use crate::types::{CollectionName, EntryKey, ExamType, Record};

/// Handle to an existing collection in the record store
#[derive(Clone)]
pub struct Collection {
    name: CollectionName,
    store_name: String,
    store: Arc<dyn RecordStoreProvider>,
}

impl Collection {
    fn new(name: CollectionName, store: Arc<dyn RecordStoreProvider>) -> Self {
        Self {
            store_name: name.as_string(),
            name,
            store,
        }
    }

    pub fn name(&self) -> CollectionName {
        self.name
    }

    pub fn exam_type(&self) -> ExamType {
        self.name.exam_type()
    }

    /// Store-level name of the collection
    pub fn as_str(&self) -> &str {
        &self.store_name
    }

    pub async fn insert_many(&self, records: &[Record]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        self.store.insert_records(&self.store_name, records).await
    }

    pub async fn find_all(&self) -> Result<Vec<Record>> {
        self.store.find_all(&self.store_name).await
    }

    pub async fn find_by_field(&self, field: &str, value: &str) -> Result<Vec<Record>> {
        self.store.find_by_field(&self.store_name, field, value).await
    }

    pub async fn first(&self) -> Result<Option<Record>> {
        self.store.first(&self.store_name).await
    }

    pub async fn count(&self) -> Result<usize> {
        self.store.count(&self.store_name).await
    }

    pub async fn contains_entry(&self, key: &EntryKey) -> Result<bool> {
        self.store.contains_entry(&self.store_name, key).await
    }

    pub async fn insert_entry(&self, key: &EntryKey, record: &Record) -> Result<()> {
        self.store
            .insert_entry(&self.store_name, key, self.exam_type(), record)
            .await
    }

    pub async fn insert_entry_if_absent(&self, key: &EntryKey, record: &Record) -> Result<bool> {
        self.store
            .insert_entry_if_absent(&self.store_name, key, self.exam_type(), record)
            .await
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.store_name)
            .finish()
    }
}

/// Registry of collections known to exist in the store.
///
/// Owns the process-wide cache of created collections; it is built once at
/// startup and lives as long as the store connection.
pub struct CollectionRegistry {
    store: Arc<dyn RecordStoreProvider>,
    known: DashMap<CollectionName, Collection>,
}

impl CollectionRegistry {
    pub fn new(store: Arc<dyn RecordStoreProvider>) -> Self {
        Self {
            store,
            known: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStoreProvider> {
        &self.store
    }

    /// Return the collection, creating it in the store if absent.
    ///
    /// Losing a create race to another caller is success: the collection
    /// exists either way.
    pub async fn ensure(&self, name: CollectionName) -> Result<Collection> {
        if let Some(existing) = self.known.get(&name) {
            return Ok(existing.clone());
        }

        let store_name = name.as_string();
        if !self.store.collection_exists(&store_name).await? {
            match self.store.create_collection(&store_name).await {
                Ok(()) => tracing::info!("Created collection {}", store_name),
                Err(Error::CollectionExists(_)) => {
                    tracing::debug!("Collection {} was created concurrently", store_name)
                }
                Err(e) => return Err(e),
            }
        }

        Ok(self.remember(name))
    }

    /// Return the collection if it exists in the store
    pub async fn get(&self, name: CollectionName) -> Result<Collection> {
        if self.exists(name).await? {
            Ok(self.remember(name))
        } else {
            Err(Error::not_found(format!("Collection {} does not exist", name)))
        }
    }

    pub async fn exists(&self, name: CollectionName) -> Result<bool> {
        if self.known.contains_key(&name) {
            return Ok(true);
        }
        self.store.collection_exists(&name.as_string()).await
    }

    /// Names of all collections in the store
    pub async fn list(&self) -> Result<Vec<String>> {
        self.store.list_collections().await
    }

    fn remember(&self, name: CollectionName) -> Collection {
        self.known
            .entry(name)
            .or_insert_with(|| Collection::new(name, Arc::clone(&self.store)))
            .clone()
    }
}
