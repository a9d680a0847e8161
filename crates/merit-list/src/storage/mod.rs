//! Storage module for persistent data storage
//!
//! Provides the SQLite record database and the collection registry on top of it.

mod database;
mod registry;

pub use database::{RecordDb, RecordDbStats};
pub use registry::{Collection, CollectionRegistry};
