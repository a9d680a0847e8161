//! Descriptive aggregates over exam and merit list collections

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::storage::CollectionRegistry;
use crate::types::{CollectionName, ExamType, Record};

/// Label of the bucket collecting values outside every declared range
pub const OTHER_BUCKET: &str = "Other";

/// Analytics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Exam aggregated when a request names none
    pub default_exam_type: ExamType,
    /// Candidate category fields, first present one wins
    pub category_aliases: Vec<String>,
    /// Ascending bucket edges; bucket i is `[b[i], b[i+1])`
    pub bucket_boundaries: Vec<f64>,
    /// One label per bucket
    pub bucket_labels: Vec<String>,
    /// Names listed per bucket
    pub sample_size: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_exam_type: ExamType::Cet,
            category_aliases: ["Gender", "gender", "SEX", "sex"]
                .into_iter()
                .map(String::from)
                .collect(),
            bucket_boundaries: vec![0.0, 50.0, 75.0, 90.0, 101.0],
            bucket_labels: ["Below 50", "50-75", "75-90", "90-100"]
                .into_iter()
                .map(String::from)
                .collect(),
            sample_size: 3,
        }
    }
}

/// Group size for one category value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDistribution {
    /// Alias that was aggregated, if any was present
    pub field_used: Option<String>,
    pub data: Vec<CategoryCount>,
}

/// Population of one numeric bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCount {
    pub range: String,
    pub count: usize,
    pub sample_students: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDistribution {
    pub field_used: String,
    pub data: Vec<BucketCount>,
}

/// Validated bucket boundaries and labels
#[derive(Debug, Clone, PartialEq)]
pub struct BucketSpec {
    boundaries: Vec<f64>,
    labels: Vec<String>,
}

impl BucketSpec {
    pub fn new(boundaries: Vec<f64>, labels: Vec<String>) -> Result<Self> {
        if boundaries.len() < 2 {
            return Err(Error::Config(
                "At least two bucket boundaries are required".to_string(),
            ));
        }
        if boundaries.iter().any(|b| !b.is_finite())
            || boundaries.windows(2).any(|w| w[0] >= w[1])
        {
            return Err(Error::Config(
                "Bucket boundaries must be finite and strictly increasing".to_string(),
            ));
        }
        if labels.len() != boundaries.len() - 1 {
            return Err(Error::Config(format!(
                "{} bucket boundaries need {} labels, got {}",
                boundaries.len(),
                boundaries.len() - 1,
                labels.len()
            )));
        }
        Ok(Self { boundaries, labels })
    }

    pub fn from_config(config: &AnalyticsConfig) -> Result<Self> {
        Self::new(config.bucket_boundaries.clone(), config.bucket_labels.clone())
    }

    /// Index of the half-open bucket containing `value`
    pub fn bucket_of(&self, value: f64) -> Option<usize> {
        let lower = *self.boundaries.first()?;
        let upper = *self.boundaries.last()?;
        if value < lower || value >= upper {
            return None;
        }
        Some(self.boundaries.partition_point(|b| *b <= value) - 1)
    }

    /// Bucket `records` by their numeric `score_field`.
    ///
    /// Records without a parsable score are skipped. Every declared bucket is
    /// reported; the `Other` bucket only when something fell outside.
    pub fn distribute(
        &self,
        records: &[Record],
        score_field: &str,
        label_field: &str,
        sample_size: usize,
    ) -> Vec<BucketCount> {
        let mut buckets: Vec<BucketCount> = self
            .labels
            .iter()
            .map(|label| BucketCount {
                range: label.clone(),
                count: 0,
                sample_students: Vec::new(),
            })
            .collect();
        let mut other = BucketCount {
            range: OTHER_BUCKET.to_string(),
            count: 0,
            sample_students: Vec::new(),
        };

        for record in records {
            let Some(score) = record.get(score_field).and_then(|v| v.as_f64()) else {
                continue;
            };
            let bucket = match self.bucket_of(score) {
                Some(i) => &mut buckets[i],
                None => &mut other,
            };
            bucket.count += 1;
            if bucket.sample_students.len() < sample_size {
                if let Some(label) = record.get(label_field).filter(|v| !v.is_null()) {
                    bucket.sample_students.push(label.to_text());
                }
            }
        }

        if other.count > 0 {
            buckets.push(other);
        }
        buckets
    }
}

/// Group records by `field`, largest group first (ties by category text)
pub fn category_counts(records: &[Record], field: &str) -> Vec<CategoryCount> {
    let mut groups: HashMap<String, usize> = HashMap::new();
    for value in records
        .iter()
        .filter_map(|r| r.get(field))
        .filter(|v| !v.is_null())
    {
        *groups.entry(value.to_text()).or_default() += 1;
    }

    let mut counts: Vec<CategoryCount> = groups
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    counts
}

/// Aggregates for the admin dashboard
pub struct MeritAnalytics {
    registry: Arc<CollectionRegistry>,
    config: AnalyticsConfig,
    buckets: BucketSpec,
}

impl MeritAnalytics {
    pub fn new(registry: Arc<CollectionRegistry>, config: AnalyticsConfig) -> Result<Self> {
        let buckets = BucketSpec::from_config(&config)?;
        Ok(Self {
            registry,
            config,
            buckets,
        })
    }

    fn exam_type(&self, exam_tag: Option<&str>) -> Result<ExamType> {
        match exam_tag.filter(|t| !t.is_empty()) {
            Some(tag) => tag.parse(),
            None => Ok(self.config.default_exam_type),
        }
    }

    /// Distribution of promoted applicants over the first category alias
    /// present in the merit list. Empty when there is no merit list or no alias.
    pub async fn category_distribution(
        &self,
        exam_tag: Option<&str>,
    ) -> Result<CategoryDistribution> {
        let exam_type = self.exam_type(exam_tag)?;
        let empty = CategoryDistribution {
            field_used: None,
            data: Vec::new(),
        };

        let name = CollectionName::merit_list(exam_type);
        if !self.registry.exists(name).await? {
            return Ok(empty);
        }
        let collection = self.registry.get(name).await?;
        let Some(sample) = collection.first().await? else {
            return Ok(empty);
        };
        let Some(field) = self
            .config
            .category_aliases
            .iter()
            .find(|alias| sample.contains(alias))
        else {
            tracing::debug!("No category field in {}", collection.as_str());
            return Ok(empty);
        };

        let records = collection.find_all().await?;
        Ok(CategoryDistribution {
            field_used: Some(field.clone()),
            data: category_counts(&records, field),
        })
    }

    /// Score buckets over every ingested row of an exam
    pub async fn score_distribution(&self, exam_tag: Option<&str>) -> Result<ScoreDistribution> {
        let exam_type = self.exam_type(exam_tag)?;
        let fields = exam_type.fields();
        let score_field = fields.score.ok_or_else(|| {
            Error::validation(format!("Exam type {} has no score field", exam_type))
        })?;

        let name = CollectionName::raw(exam_type);
        let records = if self.registry.exists(name).await? {
            self.registry.get(name).await?.find_all().await?
        } else {
            Vec::new()
        };

        Ok(ScoreDistribution {
            field_used: score_field.to_string(),
            data: self.buckets.distribute(
                &records,
                score_field,
                fields.full_name,
                self.config.sample_size,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SqliteRecordStore;
    use crate::types::{EntryKey, FieldValue};

    fn default_buckets() -> BucketSpec {
        BucketSpec::from_config(&AnalyticsConfig::default()).unwrap()
    }

    fn scored(name: &str, score: &str) -> Record {
        Record::new()
            .with("Candidate's Full Name", name)
            .with("Percentile\r_Mark", score)
    }

    #[test]
    fn test_boundaries_are_half_open() {
        let spec = default_buckets();
        assert_eq!(spec.bucket_of(0.0), Some(0));
        assert_eq!(spec.bucket_of(49.99), Some(0));
        assert_eq!(spec.bucket_of(50.0), Some(1));
        assert_eq!(spec.bucket_of(90.0), Some(3));
        assert_eq!(spec.bucket_of(100.0), Some(3));
        assert_eq!(spec.bucket_of(101.0), None);
        assert_eq!(spec.bucket_of(-1.0), None);
    }

    #[test]
    fn test_out_of_range_goes_to_other() {
        let spec = BucketSpec::new(
            vec![0.0, 50.0, 100.0],
            vec!["low".to_string(), "high".to_string()],
        )
        .unwrap();
        let records = vec![scored("A", "100.5"), scored("B", "50")];

        let buckets = spec.distribute(&records, "Percentile\r_Mark", "Candidate's Full Name", 3);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[1].range, "high");
        assert_eq!(buckets[1].sample_students, vec!["B"]);
        assert_eq!(buckets[2].range, OTHER_BUCKET);
        assert_eq!(buckets[2].count, 1);
    }

    #[test]
    fn test_default_top_bucket_reaches_101() {
        let buckets = default_buckets();
        assert_eq!(buckets.bucket_of(100.5), Some(3));

        let records = vec![scored("A", "100.5"), scored("B", "50")];
        let data = buckets.distribute(&records, "Percentile\r_Mark", "Candidate's Full Name", 3);
        let summary: Vec<_> = data.iter().map(|b| (b.range.as_str(), b.count)).collect();
        assert_eq!(
            summary,
            vec![("Below 50", 0), ("50-75", 1), ("75-90", 0), ("90-100", 1)]
        );
        assert_eq!(data[1].sample_students, vec!["B"]);
        assert_eq!(data[3].sample_students, vec!["A"]);
    }

    #[test]
    fn test_declared_buckets_always_reported() {
        let records = vec![
            scored("A", "95.1"),
            scored("B", "not graded"),
            scored("C", "92"),
            scored("D", "97"),
            scored("E", "99.9"),
            Record::new().with("Candidate's Full Name", "F"),
            Record::new()
                .with("Candidate's Full Name", "G")
                .with("Percentile\r_Mark", FieldValue::Null),
        ];

        let buckets = default_buckets().distribute(&records, "Percentile\r_Mark", "Candidate's Full Name", 3);
        let summary: Vec<_> = buckets.iter().map(|b| (b.range.as_str(), b.count)).collect();
        assert_eq!(
            summary,
            vec![("Below 50", 0), ("50-75", 0), ("75-90", 0), ("90-100", 4)]
        );
        assert_eq!(buckets[3].sample_students, vec!["A", "C", "D"]);
    }

    #[test]
    fn test_invalid_bucket_specs_rejected() {
        let labels = |n: usize| (0..n).map(|i| i.to_string()).collect::<Vec<_>>();
        assert!(BucketSpec::new(vec![0.0], labels(0)).is_err());
        assert!(BucketSpec::new(vec![0.0, 50.0, 50.0], labels(2)).is_err());
        assert!(BucketSpec::new(vec![0.0, 50.0, 100.0], labels(3)).is_err());
        assert!(BucketSpec::new(vec![0.0, f64::NAN], labels(1)).is_err());
    }

    #[test]
    fn test_category_counts_sorted_by_size() {
        let record = |g: &str| Record::new().with("Gender", g);
        let records = vec![
            record("F"),
            record("M"),
            record("F"),
            record("T"),
            record("M"),
            record("F"),
            Record::new(),
        ];

        assert_eq!(
            category_counts(&records, "Gender"),
            vec![
                CategoryCount { category: "F".to_string(), count: 3 },
                CategoryCount { category: "M".to_string(), count: 2 },
                CategoryCount { category: "T".to_string(), count: 1 },
            ]
        );
    }

    async fn analytics() -> (Arc<CollectionRegistry>, MeritAnalytics) {
        let store = Arc::new(SqliteRecordStore::in_memory().unwrap());
        let registry = Arc::new(CollectionRegistry::new(store));
        let analytics =
            MeritAnalytics::new(Arc::clone(&registry), AnalyticsConfig::default()).unwrap();
        (registry, analytics)
    }

    #[tokio::test]
    async fn test_category_distribution_uses_first_present_alias() {
        let (registry, analytics) = analytics().await;
        assert!(analytics.category_distribution(None).await.unwrap().data.is_empty());

        let merit_list = registry
            .ensure(CollectionName::merit_list(ExamType::Cet))
            .await
            .unwrap();
        for (id, sex) in [("1", "F"), ("2", "M"), ("3", "F")] {
            let record = Record::new().with("Candidate's Full Name", id).with("SEX", sex);
            merit_list
                .insert_entry(&EntryKey::new(id, id), &record)
                .await
                .unwrap();
        }

        let distribution = analytics.category_distribution(Some("CET")).await.unwrap();
        assert_eq!(distribution.field_used.as_deref(), Some("SEX"));
        assert_eq!(distribution.data[0], CategoryCount { category: "F".to_string(), count: 2 });
    }

    #[tokio::test]
    async fn test_score_distribution_over_raw_rows() {
        let (registry, analytics) = analytics().await;
        let raw = registry.ensure(CollectionName::raw(ExamType::Cet)).await.unwrap();
        raw.insert_many(&[scored("A", "45.5"), scored("B", "88.2"), scored("C", "bad")])
            .await
            .unwrap();

        let distribution = analytics.score_distribution(None).await.unwrap();
        assert_eq!(distribution.field_used, "Percentile\r_Mark");
        let counts: Vec<_> = distribution.data.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 0]);

        assert!(matches!(
            analytics.score_distribution(Some("JEE")).await,
            Err(Error::Validation(_))
        ));
    }
}
