//! Sorted and filtered merit list retrieval

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::storage::{Collection, CollectionRegistry};
use crate::types::{CollectionName, ExamType, FieldValue, Record};

/// Read side of the merit list collections
pub struct MeritListQuery {
    registry: Arc<CollectionRegistry>,
}

impl MeritListQuery {
    pub fn new(registry: Arc<CollectionRegistry>) -> Self {
        Self { registry }
    }

    /// Merit list for `exam_tag` in ascending rank order, optionally
    /// restricted to one category (exact match).
    pub async fn query(&self, exam_tag: &str, category: Option<&str>) -> Result<Vec<Record>> {
        let exam_type: ExamType = exam_tag.parse()?;
        let collection = self.merit_list(exam_type).await?;
        let rank = exam_type.fields().rank.ok_or_else(|| {
            Error::validation(format!("Exam type {} has no rank field", exam_type))
        })?;

        let mut records = non_empty(&collection).await?;
        sort_by_rank(&mut records, rank);

        let Some(category) = category.filter(|c| !c.is_empty()) else {
            return Ok(records);
        };

        let category_field = exam_type.fields().category;
        let filtered: Vec<Record> = records
            .into_iter()
            .filter(|r| r.get(category_field).and_then(|v| v.as_str()) == Some(category))
            .collect();
        if filtered.is_empty() {
            return Err(Error::not_found(format!(
                "No records found for category {} in {}",
                category,
                collection.as_str()
            )));
        }

        tracing::debug!(
            "{} records for {} category {}",
            filtered.len(),
            collection.as_str(),
            category
        );
        Ok(filtered)
    }

    /// Full merit list for export: rank order when the exam has a rank
    /// field, insertion order otherwise
    pub async fn ordered(&self, exam_type: ExamType) -> Result<Vec<Record>> {
        let collection = self.merit_list(exam_type).await?;
        let mut records = non_empty(&collection).await?;
        if let Some(rank) = exam_type.fields().rank {
            sort_by_rank(&mut records, rank);
        }
        Ok(records)
    }

    /// Number of applicants promoted into an exam's merit list
    pub async fn count(&self, exam_tag: &str) -> Result<usize> {
        let exam_type: ExamType = exam_tag.parse()?;
        self.merit_list(exam_type).await?.count().await
    }

    async fn merit_list(&self, exam_type: ExamType) -> Result<Collection> {
        self.registry.get(CollectionName::merit_list(exam_type)).await
    }
}

async fn non_empty(collection: &Collection) -> Result<Vec<Record>> {
    let records = collection.find_all().await?;
    if records.is_empty() {
        return Err(Error::not_found(format!(
            "No records found in {}",
            collection.as_str()
        )));
    }
    Ok(records)
}

/// Rank ordering key: missing first, then numbers ascending, then text
enum RankKey<'a> {
    Missing,
    Number(f64),
    Text(&'a str),
}

fn rank_key(value: Option<&FieldValue>) -> RankKey<'_> {
    match value {
        None | Some(FieldValue::Null) => RankKey::Missing,
        Some(v) => match v.as_f64() {
            Some(n) => RankKey::Number(n),
            None => RankKey::Text(v.as_str().unwrap_or_default()),
        },
    }
}

/// Compare two rank values. Numeric strings compare as numbers.
pub fn compare_rank(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (rank_key(a), rank_key(b)) {
        (RankKey::Missing, RankKey::Missing) => Ordering::Equal,
        (RankKey::Missing, _) => Ordering::Less,
        (_, RankKey::Missing) => Ordering::Greater,
        (RankKey::Number(x), RankKey::Number(y)) => x.total_cmp(&y),
        (RankKey::Number(_), RankKey::Text(_)) => Ordering::Less,
        (RankKey::Text(_), RankKey::Number(_)) => Ordering::Greater,
        (RankKey::Text(x), RankKey::Text(y)) => x.cmp(y),
    }
}

/// Stable ascending sort on `field`
pub fn sort_by_rank(records: &mut [Record], field: &str) {
    records.sort_by(|a, b| compare_rank(a.get(field), b.get(field)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SqliteRecordStore;
    use crate::types::EntryKey;

    fn entry(name: &str, rank: Option<&str>, category: &str) -> Record {
        let mut record = Record::new()
            .with("Application\rID", format!("ID-{}", name))
            .with("Candidate's Full Name", name);
        match rank {
            Some(rank) => record.insert("Merit\rNo", rank),
            None => record.insert("Merit\rNo", FieldValue::Null),
        }
        record.with("Category", category)
    }

    async fn merit_list(exam_type: ExamType, rows: &[Record]) -> MeritListQuery {
        let store = Arc::new(SqliteRecordStore::in_memory().unwrap());
        let registry = Arc::new(CollectionRegistry::new(store));
        let collection = registry
            .ensure(CollectionName::merit_list(exam_type))
            .await
            .unwrap();
        for row in rows {
            let name = row
                .get("Candidate's Full Name")
                .map(|v| v.to_text())
                .unwrap_or_default();
            let key = EntryKey::new(&format!("ID-{}", name), &name);
            collection.insert_entry_if_absent(&key, row).await.unwrap();
        }
        MeritListQuery::new(registry)
    }

    fn ranks(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.get("Merit\rNo").map(|v| v.to_text()).unwrap_or_default())
            .collect()
    }

    #[tokio::test]
    async fn test_sorted_numerically_not_lexically() {
        let query = merit_list(
            ExamType::Jee,
            &[
                entry("A", Some("30"), "OPEN"),
                entry("B", Some("5"), "OBC"),
                entry("C", Some("17"), "OPEN"),
            ],
        )
        .await;

        let records = query.query("JEE", None).await.unwrap();
        assert_eq!(ranks(&records), vec!["5", "17", "30"]);
    }

    #[tokio::test]
    async fn test_category_filter_keeps_rank_order() {
        let query = merit_list(
            ExamType::Cet,
            &[
                entry("A", Some("30"), "OPEN"),
                entry("B", Some("5"), "OBC"),
                entry("C", Some("17"), "OPEN"),
            ],
        )
        .await;

        let records = query.query("CET", Some("OPEN")).await.unwrap();
        assert_eq!(ranks(&records), vec!["17", "30"]);

        let all = query.query("CET", Some("")).await.unwrap();
        assert_eq!(all.len(), 3);

        let result = query.query("CET", Some("open")).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_and_empty_collections_are_not_found() {
        let store = Arc::new(SqliteRecordStore::in_memory().unwrap());
        let registry = Arc::new(CollectionRegistry::new(store));
        let query = MeritListQuery::new(Arc::clone(&registry));

        assert!(matches!(query.query("ME", None).await, Err(Error::NotFound(_))));
        assert!(matches!(query.count("ME").await, Err(Error::NotFound(_))));

        registry
            .ensure(CollectionName::merit_list(ExamType::Me))
            .await
            .unwrap();
        assert!(matches!(query.query("ME", None).await, Err(Error::NotFound(_))));
        assert_eq!(query.count("ME").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_exam_without_rank_is_validation_error() {
        let query = merit_list(ExamType::Dse, &[entry("A", Some("1"), "OPEN")]).await;
        assert!(matches!(query.query("DSE", None).await, Err(Error::Validation(_))));
        assert!(matches!(query.query("GATE", None).await, Err(Error::Validation(_))));

        // Export still works, in insertion order
        assert_eq!(query.ordered(ExamType::Dse).await.unwrap().len(), 1);
    }

    #[test]
    fn test_rank_ordering_rules() {
        let mut records = vec![
            entry("text", Some("N/A"), "OPEN"),
            entry("ten", Some("10"), "OPEN"),
            entry("missing", None, "OPEN"),
            entry("two", Some(" 2 "), "OPEN"),
            entry("also-ten", Some("10.0"), "OPEN"),
        ];
        sort_by_rank(&mut records, "Merit\rNo");

        let names: Vec<_> = records
            .iter()
            .map(|r| r.get("Candidate's Full Name").unwrap().to_text())
            .collect();
        assert_eq!(names, vec!["missing", "two", "ten", "also-ten", "text"]);
    }
}
