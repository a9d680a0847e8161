//! Core types for the merit list service

pub mod applicant;
pub mod exam;
pub mod query;
pub mod record;
pub mod response;

pub use applicant::{Applicant, EntryKey, MeritListEntry, NewApplicant};
pub use exam::{CollectionKind, CollectionName, ExamFields, ExamType, MERIT_LIST_PREFIX};
pub use query::{AnalyticsParams, DownloadRequest, LookupRequest, MeritListRequest};
pub use record::{FieldValue, Record};
pub use response::{CountResponse, MeritListResponse, SubmitResponse, UploadResponse};
