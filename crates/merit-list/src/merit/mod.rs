//! Merit list queries, CSV export and dashboard aggregates

pub mod analytics;
mod export;
mod query;

pub use analytics::{
    category_counts, AnalyticsConfig, BucketCount, BucketSpec, CategoryCount,
    CategoryDistribution, MeritAnalytics, ScoreDistribution, OTHER_BUCKET,
};
pub use export::{CsvExport, CsvExporter, MeritListExporter};
pub use query::{compare_rank, sort_by_rank, MeritListQuery};
