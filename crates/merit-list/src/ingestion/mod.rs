//! Document ingestion pipeline backed by external table tools

pub mod external_tool;
mod parser;
mod pipeline;
mod stage;

pub use external_tool::{ExtractStage, NormalizeStage, PipelineConfig, ToolCommand};
pub use parser::TableParser;
pub use pipeline::{cleaned_path, DynExtract, DynNormalize, IngestPipeline, IngestReport};
pub use stage::{NormalizeRequest, PipelineStage, Stage};
