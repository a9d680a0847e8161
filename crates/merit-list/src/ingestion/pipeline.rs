//! Document ingestion: extract → normalize → parse → load

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::storage::CollectionRegistry;
use crate::types::{CollectionName, ExamType};

use super::external_tool::{ExtractStage, NormalizeStage, PipelineConfig};
use super::parser::TableParser;
use super::stage::{NormalizeRequest, PipelineStage, Stage};

/// Document → intermediate table
pub type DynExtract = Arc<dyn Stage<Input = PathBuf, Output = PathBuf>>;
/// Intermediate table → cleaned table
pub type DynNormalize = Arc<dyn Stage<Input = NormalizeRequest, Output = PathBuf>>;

/// Outcome of one ingested document
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub exam_type: ExamType,
    pub collection: String,
    pub record_count: usize,
}

/// Turns result documents into rows of a raw exam collection
pub struct IngestPipeline {
    extract: DynExtract,
    normalize: DynNormalize,
    parser: TableParser,
    registry: Arc<CollectionRegistry>,
    upload_dir: PathBuf,
}

impl IngestPipeline {
    /// Pipeline backed by the configured external tools
    pub fn new(
        registry: Arc<CollectionRegistry>,
        config: &PipelineConfig,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::with_stages(
            registry,
            Arc::new(ExtractStage::from_config(config)),
            Arc::new(NormalizeStage::from_config(config)),
            upload_dir,
        )
    }

    /// Pipeline with custom extraction and normalization stages
    pub fn with_stages(
        registry: Arc<CollectionRegistry>,
        extract: DynExtract,
        normalize: DynNormalize,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extract,
            normalize,
            parser: TableParser::new(),
            registry,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Ingest a document already on disk into the collection for `exam_tag`.
    ///
    /// The tag is checked before anything runs. A failed stage aborts the
    /// run; nothing is retried or rolled back.
    pub async fn ingest(&self, document: &Path, exam_tag: &str) -> Result<IngestReport> {
        let exam_type: ExamType = exam_tag.parse()?;
        self.run(document, exam_type).await
    }

    /// Save uploaded bytes under the upload directory, then ingest them
    pub async fn ingest_upload(
        &self,
        filename: &str,
        bytes: &[u8],
        exam_tag: &str,
    ) -> Result<IngestReport> {
        let exam_type: ExamType = exam_tag.parse()?;
        let name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::validation("Upload has no usable file name"))?;
        if bytes.is_empty() {
            return Err(Error::validation("Uploaded file is empty"));
        }

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let document = self.upload_dir.join(format!("{}-{}", millis, name));
        tokio::fs::write(&document, bytes).await?;
        tracing::info!("Saved upload {} ({} bytes)", document.display(), bytes.len());

        self.run(&document, exam_type).await
    }

    async fn run(&self, document: &Path, exam_type: ExamType) -> Result<IngestReport> {
        tracing::info!(
            "Ingesting {} as {} ({})",
            document.display(),
            exam_type,
            self.extract.stage()
        );
        let table = self.extract.run(document.to_path_buf()).await?;

        tracing::info!("Normalizing {} ({})", table.display(), self.normalize.stage());
        let cleaned = self
            .normalize
            .run(NormalizeRequest {
                input: table,
                output: cleaned_path(document),
            })
            .await?;

        tracing::debug!("Reading {} ({})", cleaned.display(), self.parser.stage());
        let records = self.parser.run(cleaned).await?;

        let collection = self.registry.ensure(CollectionName::raw(exam_type)).await?;
        let record_count = match collection.insert_many(&records).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(
                    "{} failed for {}; collection is left in place: {}",
                    PipelineStage::Load,
                    collection.as_str(),
                    e
                );
                return Err(e);
            }
        };

        tracing::info!("Loaded {} records into {}", record_count, collection.as_str());
        Ok(IngestReport {
            exam_type,
            collection: collection.as_str().to_string(),
            record_count,
        })
    }
}

/// `<dir>/<stem>_cleaned.csv` next to the document
pub fn cleaned_path(document: &Path) -> PathBuf {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    document.with_file_name(format!("{}_cleaned.csv", stem))
}
