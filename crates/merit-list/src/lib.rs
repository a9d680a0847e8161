//! merit-list: exam result ingestion and merit list reconciliation
//!
//! Result documents are turned into rows of a per-exam collection by an
//! external extract → normalize tool chain. Applicants are matched against
//! those rows and promoted into deduplicated merit lists that can be
//! queried, exported as CSV and summarised for a dashboard.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod matching;
pub mod merit;
pub mod providers;
pub mod server;
pub mod storage;
pub mod types;

pub use config::MeritConfig;
pub use error::{Error, Result};
pub use ingestion::{IngestPipeline, IngestReport};
pub use matching::{ApplicantMatcher, ApplicantService};
pub use merit::{MeritAnalytics, MeritListExporter, MeritListQuery};
pub use storage::CollectionRegistry;
pub use types::{CollectionName, ExamType, FieldValue, MeritListEntry, Record};
