//! External table extraction and normalization tools
//!
//! Both collaborators are separate programs (by default the Python scripts
//! `extract_tables.py` and `preprocess_csv.py`):
//! - extraction takes a document path and prints the path of the table it wrote
//! - normalization takes that table and an output path and writes the cleaned table

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{Error, Result};

use super::stage::{NormalizeRequest, PipelineStage, Stage};

/// Program and argument template for an external tool.
///
/// `{input}` and `{output}` inside arguments are replaced with paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn render_args(&self, vars: &[(&str, &Path)]) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                vars.iter().fold(arg.clone(), |acc, (name, path)| {
                    acc.replace(&format!("{{{}}}", name), &path.to_string_lossy())
                })
            })
            .collect()
    }
}

/// External pipeline tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Table extraction tool; prints the intermediate table path on stdout
    pub extract: ToolCommand,
    /// Normalization tool; writes the cleaned table to `{output}`
    pub normalize: ToolCommand,
    /// Working directory for both tools (defaults to the process cwd)
    pub working_dir: Option<PathBuf>,
    /// Per-stage time limit in seconds, 0 disables it
    pub stage_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extract: ToolCommand::new("python", ["extract_tables.py", "{input}"]),
            normalize: ToolCommand::new("python", ["preprocess_csv.py", "{input}", "{output}"]),
            working_dir: None,
            stage_timeout_secs: 300,
        }
    }
}

impl PipelineConfig {
    pub fn stage_timeout(&self) -> Option<Duration> {
        (self.stage_timeout_secs > 0).then(|| Duration::from_secs(self.stage_timeout_secs))
    }
}

/// Captured result of one tool run
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Runs an external program as a pipeline stage
#[derive(Debug, Clone)]
pub struct ExternalTool {
    stage: PipelineStage,
    command: ToolCommand,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ExternalTool {
    pub fn new(stage: PipelineStage, command: ToolCommand) -> Self {
        Self {
            stage,
            command,
            working_dir: None,
            timeout: None,
        }
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    /// Spawn the tool and wait for it to exit.
    ///
    /// The child is killed if the time limit elapses.
    pub async fn invoke(&self, vars: &[(&str, &Path)]) -> Result<ToolOutput> {
        let program = &self.command.program;
        let args = self.command.render_args(vars);

        let mut cmd = Command::new(program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!("Running {} stage: {} {:?}", self.stage, program, args);

        let child = cmd
            .spawn()
            .map_err(|e| Error::stage(self.stage, format!("Failed to spawn {}: {}", program, e)))?;

        let wait = child.wait_with_output();
        let output = match self.timeout {
            Some(limit) => timeout(limit, wait).await.map_err(|_| {
                Error::stage(
                    self.stage,
                    format!("{} did not finish within {:?}", program, limit),
                )
            })?,
            None => wait.await,
        }
        .map_err(|e| Error::stage(self.stage, format!("{} failed: {}", program, e)))?;

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !stderr.trim().is_empty() {
            tracing::warn!("{} stage stderr: {}", self.stage, stderr.trim());
        }

        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr,
        })
    }

    fn resolve(&self, emitted: &str) -> PathBuf {
        let path = PathBuf::from(emitted);
        match &self.working_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }

    fn exit_error(&self, output: &ToolOutput) -> Error {
        Error::stage(
            self.stage,
            format!(
                "{} exited with {}: {}",
                self.command.program,
                output.status,
                output.stderr.trim()
            ),
        )
    }
}

/// Document → intermediate table
pub struct ExtractStage {
    tool: ExternalTool,
}

impl ExtractStage {
    pub fn new(command: ToolCommand) -> Self {
        Self {
            tool: ExternalTool::new(PipelineStage::Extract, command),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            tool: ExternalTool::new(PipelineStage::Extract, config.extract.clone())
                .with_working_dir(config.working_dir.clone())
                .with_timeout(config.stage_timeout()),
        }
    }

    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.tool = self.tool.with_timeout(limit);
        self
    }
}

#[async_trait]
impl Stage for ExtractStage {
    type Input = PathBuf;
    type Output = PathBuf;

    fn stage(&self) -> PipelineStage {
        PipelineStage::Extract
    }

    async fn run(&self, document: PathBuf) -> Result<PathBuf> {
        let output = self.tool.invoke(&[("input", &document)]).await?;
        if !output.status.success() {
            return Err(self.tool.exit_error(&output));
        }

        // The tool prints the table path as its last line
        let emitted = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .ok_or_else(|| Error::stage(PipelineStage::Extract, "tool emitted no table path"))?;

        let table = self.tool.resolve(emitted);
        if !table.exists() {
            return Err(Error::stage(
                PipelineStage::Extract,
                format!("emitted table {} does not exist", table.display()),
            ));
        }

        tracing::info!("Extracted table: {}", table.display());
        Ok(table)
    }
}

/// Intermediate table → cleaned table
pub struct NormalizeStage {
    tool: ExternalTool,
}

impl NormalizeStage {
    pub fn new(command: ToolCommand) -> Self {
        Self {
            tool: ExternalTool::new(PipelineStage::Normalize, command),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            tool: ExternalTool::new(PipelineStage::Normalize, config.normalize.clone())
                .with_working_dir(config.working_dir.clone())
                .with_timeout(config.stage_timeout()),
        }
    }
}

#[async_trait]
impl Stage for NormalizeStage {
    type Input = NormalizeRequest;
    type Output = PathBuf;

    fn stage(&self) -> PipelineStage {
        PipelineStage::Normalize
    }

    async fn run(&self, request: NormalizeRequest) -> Result<PathBuf> {
        // A cleaned table left by an earlier run must not pass for this one
        match tokio::fs::remove_file(&request.output).await {
            Ok(()) => tracing::debug!("Removed stale {}", request.output.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::stage(
                    PipelineStage::Normalize,
                    format!("cannot clear {}: {}", request.output.display(), e),
                ))
            }
        }

        let output = self
            .tool
            .invoke(&[("input", &request.input), ("output", &request.output)])
            .await?;
        if !output.status.success() {
            return Err(self.tool.exit_error(&output));
        }
        if !request.output.exists() {
            return Err(Error::stage(
                PipelineStage::Normalize,
                format!("cleaned table {} was not written", request.output.display()),
            ));
        }

        tracing::info!("Normalized table: {}", request.output.display());
        Ok(request.output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, extra: &[&str]) -> ToolCommand {
        let mut args = vec!["-c".to_string(), script.to_string(), "sh".to_string()];
        args.extend(extra.iter().map(|s| s.to_string()));
        ToolCommand::new("sh", args)
    }

    #[test]
    fn test_render_placeholders() {
        let command = ToolCommand::new("python", ["prep.py", "{input}", "--out={output}"]);
        let args = command.render_args(&[
            ("input", Path::new("/tmp/a.csv")),
            ("output", Path::new("/tmp/b.csv")),
        ]);
        assert_eq!(args, vec!["prep.py", "/tmp/a.csv", "--out=/tmp/b.csv"]);
    }

    #[tokio::test]
    async fn test_extract_returns_emitted_path() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("doc.csv");
        std::fs::write(&table, "a,b\n1,2\n").unwrap();

        // Diagnostic lines before the path are ignored
        let stage = ExtractStage::new(sh("echo 'reading pages'; echo \"$1\"", &[&table.to_string_lossy()]));
        let result = stage.run(dir.path().join("doc.pdf")).await.unwrap();
        assert_eq!(result, table);
    }

    #[tokio::test]
    async fn test_extract_nonzero_exit_is_stage_error() {
        let stage = ExtractStage::new(sh("echo 'No tables found' >&2; exit 1", &[]));
        let err = stage.run(PathBuf::from("/tmp/doc.pdf")).await.unwrap_err();
        assert_eq!(err.failed_stage(), Some(PipelineStage::Extract));
        assert!(err.to_string().contains("No tables found"));
    }

    #[tokio::test]
    async fn test_extract_without_output_is_stage_error() {
        let stage = ExtractStage::new(sh("true", &[]));
        let err = stage.run(PathBuf::from("/tmp/doc.pdf")).await.unwrap_err();
        assert_eq!(err.failed_stage(), Some(PipelineStage::Extract));

        let stage = ExtractStage::new(sh("echo /nonexistent/dir/table.csv", &[]));
        let err = stage.run(PathBuf::from("/tmp/doc.pdf")).await.unwrap_err();
        assert_eq!(err.failed_stage(), Some(PipelineStage::Extract));
    }

    #[tokio::test]
    async fn test_extract_timeout_is_stage_error() {
        let stage = ExtractStage::new(sh("sleep 5", &[]))
            .with_timeout(Some(Duration::from_millis(200)));
        let err = stage.run(PathBuf::from("/tmp/doc.pdf")).await.unwrap_err();
        assert_eq!(err.failed_stage(), Some(PipelineStage::Extract));
        assert!(err.to_string().contains("did not finish"));
    }

    #[tokio::test]
    async fn test_normalize_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.csv");
        let output = dir.path().join("doc_cleaned.csv");
        std::fs::write(&input, "a,b\n1,2\n").unwrap();

        let stage = NormalizeStage::new(sh("cp \"$1\" \"$2\"", &["{input}", "{output}"]));
        let result = stage
            .run(NormalizeRequest {
                input: input.clone(),
                output: output.clone(),
            })
            .await
            .unwrap();
        assert_eq!(result, output);
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_normalize_missing_output_is_stage_error() {
        let dir = tempfile::tempdir().unwrap();
        let stage = NormalizeStage::new(sh("exit 0", &["{input}", "{output}"]));
        let err = stage
            .run(NormalizeRequest {
                input: dir.path().join("doc.csv"),
                output: dir.path().join("doc_cleaned.csv"),
            })
            .await
            .unwrap_err();
        assert_eq!(err.failed_stage(), Some(PipelineStage::Normalize));
    }

    #[tokio::test]
    async fn test_normalize_ignores_stale_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("doc_cleaned.csv");
        std::fs::write(&output, "a\nSTALE\n").unwrap();

        let stage = NormalizeStage::new(sh("exit 0", &["{input}", "{output}"]));
        let err = stage
            .run(NormalizeRequest {
                input: dir.path().join("doc.csv"),
                output: output.clone(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.failed_stage(), Some(PipelineStage::Normalize));
        assert!(!output.exists());
    }
}
