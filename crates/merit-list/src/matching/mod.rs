//! Applicant submissions and reconciliation against ingested exam rows

mod applicants;
mod matcher;

pub use applicants::ApplicantService;
pub use matcher::{ApplicantMatcher, MatcherConfig};
