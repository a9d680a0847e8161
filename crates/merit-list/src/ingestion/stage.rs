//! Sequential pipeline stages

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::error::Result;

/// Step of the ingestion pipeline, used to tag stage failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Extract,
    Normalize,
    Parse,
    Load,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Normalize => "normalize",
            Self::Parse => "parse",
            Self::Load => "load",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the pipeline. Its output is the next step's input.
#[async_trait]
pub trait Stage: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Which step this is
    fn stage(&self) -> PipelineStage;

    /// Run the step. Failures carry the stage tag.
    async fn run(&self, input: Self::Input) -> Result<Self::Output>;
}

/// Input of the normalization step: the extracted table and where to write
/// the cleaned one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeRequest {
    pub input: PathBuf,
    pub output: PathBuf,
}
