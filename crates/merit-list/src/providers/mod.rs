//! Provider abstractions for the record store
//!
//! The service consumes a document store through a trait so the storage
//! engine can be swapped without touching the pipeline or matcher.

pub mod local;
pub mod record_store;

pub use local::SqliteRecordStore;
pub use record_store::RecordStoreProvider;
