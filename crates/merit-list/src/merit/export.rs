//! Column-projected CSV export of merit lists

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{ExamType, Record};

use super::query::MeritListQuery;

/// Serializes records as CSV
#[derive(Debug, Clone, Default)]
pub struct CsvExporter;

impl CsvExporter {
    /// Write `records` as CSV.
    ///
    /// With `columns` given, exactly those columns are written (missing
    /// fields become empty cells); otherwise the fields of the first record.
    pub fn to_csv(records: &[Record], columns: &[String]) -> Result<Vec<u8>> {
        let header: Vec<String> = if columns.is_empty() {
            records
                .first()
                .map(|r| r.field_names().map(str::to_string).collect())
                .unwrap_or_default()
        } else {
            columns.to_vec()
        };
        if header.is_empty() {
            return Ok(Vec::new());
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&header)?;
        for record in records {
            writer.write_record(
                header
                    .iter()
                    .map(|column| record.get(column).map(|v| v.to_text()).unwrap_or_default()),
            )?;
        }

        writer
            .into_inner()
            .map_err(|e| Error::internal(format!("CSV flush failed: {}", e)))
    }
}

/// A rendered download
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Builds merit list downloads
pub struct MeritListExporter {
    query: Arc<MeritListQuery>,
}

impl MeritListExporter {
    pub fn new(query: Arc<MeritListQuery>) -> Self {
        Self { query }
    }

    pub async fn export(&self, exam_tag: &str, columns: &[String]) -> Result<CsvExport> {
        let exam_type: ExamType = exam_tag.parse()?;
        let records = self.query.ordered(exam_type).await?;
        let bytes = CsvExporter::to_csv(&records, columns)?;

        tracing::info!(
            "Exported {} rows of {} merit list ({} bytes)",
            records.len(),
            exam_type,
            bytes.len()
        );
        Ok(CsvExport {
            filename: exam_type.export_filename(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SqliteRecordStore;
    use crate::storage::CollectionRegistry;
    use crate::types::{CollectionName, EntryKey};

    fn applicant(name: &str, rank: &str) -> Record {
        Record::new()
            .with("Application\rID", format!("ID-{}", name))
            .with("name", name)
            .with("rank", rank)
            .with("Merit\rNo", rank)
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_projection_header_and_rows() {
        let records = vec![applicant("Riya", "1"), applicant("Aman", "2")];
        let columns = vec!["name".to_string(), "rank".to_string()];

        let csv = text(CsvExporter::to_csv(&records, &columns).unwrap());
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines, vec!["name,rank", "Riya,1", "Aman,2"]);
    }

    #[test]
    fn test_missing_column_is_empty_cell() {
        let records = vec![applicant("Riya", "1")];
        let columns = vec!["name".to_string(), "Gender".to_string()];

        let csv = text(CsvExporter::to_csv(&records, &columns).unwrap());
        assert_eq!(csv, "name,Gender\nRiya,\n");
    }

    #[test]
    fn test_default_columns_quote_irregular_headers() {
        let records = vec![Record::new().with("Merit\rNo", "4").with("Full, Name", "Riya \"R\" P")];

        let csv = text(CsvExporter::to_csv(&records, &[]).unwrap());
        assert_eq!(csv, "\"Merit\rNo\",\"Full, Name\"\n4,\"Riya \"\"R\"\" P\"\n");
    }

    #[tokio::test]
    async fn test_export_in_rank_order_with_filename() {
        let store = Arc::new(SqliteRecordStore::in_memory().unwrap());
        let registry = Arc::new(CollectionRegistry::new(store));
        let merit_list = registry
            .ensure(CollectionName::merit_list(ExamType::Cet))
            .await
            .unwrap();
        for (name, rank) in [("Riya", "12"), ("Aman", "3")] {
            merit_list
                .insert_entry(&EntryKey::new(&format!("ID-{}", name), name), &applicant(name, rank))
                .await
                .unwrap();
        }

        let exporter = MeritListExporter::new(Arc::new(MeritListQuery::new(registry)));
        let export = exporter
            .export("CET", &["name".to_string()])
            .await
            .unwrap();
        assert_eq!(export.filename, "CET_merit_list.csv");
        assert_eq!(text(export.bytes), "name\nAman\nRiya\n");

        assert!(matches!(
            exporter.export("JEE", &[]).await,
            Err(Error::NotFound(_))
        ));
    }
}
