//! Cleaned table parser

use async_trait::async_trait;
use std::io::Read;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::{FieldValue, Record};

use super::stage::{PipelineStage, Stage};

/// Parses a cleaned CSV table into records.
///
/// The first row is the header. Header cells become field names verbatim,
/// including line breaks left over from wrapped header cells.
#[derive(Debug, Clone, Default)]
pub struct TableParser;

impl TableParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a table from any reader
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<Vec<Record>> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers: Vec<String> = csv
            .headers()
            .map_err(parse_error)?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                if i == 0 {
                    h.trim_start_matches('\u{feff}').to_string()
                } else {
                    h.to_string()
                }
            })
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(Error::stage(PipelineStage::Parse, "table has no header row"));
        }

        let mut records = Vec::new();
        for row in csv.records() {
            let row = row.map_err(parse_error)?;
            let record: Record = headers
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name.clone(), FieldValue::from_cell(cell)))
                .collect();
            records.push(record);
        }

        Ok(records)
    }
}

fn parse_error(err: csv::Error) -> Error {
    Error::stage(PipelineStage::Parse, err.to_string())
}

#[async_trait]
impl Stage for TableParser {
    type Input = PathBuf;
    type Output = Vec<Record>;

    fn stage(&self) -> PipelineStage {
        PipelineStage::Parse
    }

    async fn run(&self, table: PathBuf) -> Result<Vec<Record>> {
        let parser = self.clone();
        let records = tokio::task::spawn_blocking(move || {
            let file = std::fs::File::open(&table).map_err(|e| {
                Error::stage(
                    PipelineStage::Parse,
                    format!("cannot open {}: {}", table.display(), e),
                )
            })?;
            parser.parse_reader(std::io::BufReader::new(file))
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        tracing::info!("Parsed {} records", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_kept_verbatim() {
        let table = "\"Application\rID\",Candidate's Full Name,\"Merit\rNo\",Category\n\
                     EN001,Riya Patil,4,OPEN\n\
                     EN002,Aman Shah,,OBC\n";
        let records = TableParser::new().parse_reader(table.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        let names: Vec<_> = records[0].field_names().collect();
        assert_eq!(
            names,
            vec!["Application\rID", "Candidate's Full Name", "Merit\rNo", "Category"]
        );
        assert_eq!(records[0].get("Application\rID"), Some(&FieldValue::from("EN001")));
        assert!(records[1].get("Merit\rNo").unwrap().is_null());
    }

    #[test]
    fn test_leading_zeros_preserved() {
        let table = "Application ID,Score\n007,91.5\n";
        let records = TableParser::new().parse_reader(table.as_bytes()).unwrap();
        assert_eq!(records[0].get("Application ID").and_then(|v| v.as_str()), Some("007"));
    }

    #[test]
    fn test_ragged_row_is_parse_error() {
        let table = "a,b,c\n1,2,3\n4,5\n";
        let err = TableParser::new().parse_reader(table.as_bytes()).unwrap_err();
        assert_eq!(err.failed_stage(), Some(PipelineStage::Parse));
    }

    #[test]
    fn test_header_only_table_is_empty() {
        let records = TableParser::new().parse_reader("a,b\n".as_bytes()).unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_parse_error() {
        let err = TableParser::new()
            .run(PathBuf::from("/nonexistent/dir/table_cleaned.csv"))
            .await
            .unwrap_err();
        assert_eq!(err.failed_stage(), Some(PipelineStage::Parse));
    }
}
