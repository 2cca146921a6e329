use crate::models::{ExtractionRecord, ProcessingMode};
use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Trait for PDF line-item extraction implementations
#[async_trait::async_trait]
pub trait PdfExtractor: Send + Sync {
    /// Extract line items from the PDF at `pdf_path`. `output_dir` is a private,
    /// empty directory the extractor may use for intermediate artifacts.
    async fn extract(&self, pdf_path: &Path, output_dir: &Path) -> Result<Vec<ExtractionRecord>>;

    /// Mode reported to clients while this extractor is active
    fn mode(&self) -> ProcessingMode;

    /// Check if the extractor is available/healthy
    async fn health_check(&self) -> bool;
}

/// Stand-in extractor for demos and tests: waits, then returns two fixed records
/// regardless of the uploaded content.
pub struct MockExtractor {
    delay: Duration,
}

impl MockExtractor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn sample_records() -> Vec<ExtractionRecord> {
        let note = "Данные обработаны через API (тестовый режим)";
        let records = [
            json!({
                "id": "gen-1721161200000-0",
                "pos": "П1",
                "name": "ИТП",
                "type_original": "Кан.вент. IP54, FRC 60-30",
                "code": "",
                "manufacturer": "",
                "measure": "",
                "quantity": "1",
                "weight": "",
                "note": "",
                "article": "",
                "rag_text": "итп категория кан.вент. ip54 frc 60-30",
                "artikul": "",
                "category": "кан.вент.",
                "sub_category": "",
                "description": "ip54 frc 60-30",
                "material": "",
                "type_extracted": "",
                "connection_type": "",
                "size": "",
                "allies": "",
                "function": "",
                "Artikul_fact": "",
                "potential_artikuls": [],
                "manual_check_needed": true,
                "matching_thoughts": note,
                "found_in_pdf_on_pages": [1]
            }),
            json!({
                "id": "gen-1721161200000-1",
                "pos": "П2",
                "name": "Помещения охраны",
                "type_original": "Кан.вент. IP54, KVR 100/1",
                "code": "",
                "manufacturer": "",
                "measure": "",
                "quantity": "1",
                "weight": "",
                "note": "",
                "article": "",
                "rag_text": "помещения охраны категория кан.вент. ip54 kvr 100/1",
                "artikul": "100/1",
                "category": "кан.вент.",
                "sub_category": "",
                "description": "помещения охраны",
                "material": "",
                "type_extracted": "kvr",
                "connection_type": "",
                "size": "",
                "allies": "",
                "function": "",
                "Artikul_fact": "",
                "potential_artikuls": [],
                "manual_check_needed": true,
                "matching_thoughts": note,
                "found_in_pdf_on_pages": [1]
            }),
        ];

        records
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl PdfExtractor for MockExtractor {
    async fn extract(&self, pdf_path: &Path, _output_dir: &Path) -> Result<Vec<ExtractionRecord>> {
        tokio::time::sleep(self.delay).await;
        tracing::info!("Mock extraction for {}", pdf_path.display());
        Ok(Self::sample_records())
    }

    fn mode(&self) -> ProcessingMode {
        ProcessingMode::Demo
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Runs an external extraction program:
/// `<program> [args...] <pdf_path> <output_dir>`
///
/// The program must print a JSON array of objects on stdout and exit with 0.
pub struct CommandExtractor {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandExtractor {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait::async_trait]
impl PdfExtractor for CommandExtractor {
    async fn extract(&self, pdf_path: &Path, output_dir: &Path) -> Result<Vec<ExtractionRecord>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(pdf_path)
            .arg(output_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to start extractor {}", self.program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            return Err(match output.status.code() {
                Some(code) if stderr.is_empty() => anyhow!("Extractor exited with status {}", code),
                Some(code) => anyhow!("Extractor exited with status {}: {}", code, stderr),
                None => anyhow!("Extractor was terminated by a signal"),
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            tracing::debug!("Extractor stderr: {}", stderr.trim());
        }

        parse_records(&output.stdout)
    }

    fn mode(&self) -> ProcessingMode {
        ProcessingMode::Production
    }

    async fn health_check(&self) -> bool {
        tokio::fs::metadata(&self.program)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }
}

/// Parses extractor stdout: a JSON array whose elements are all objects.
pub fn parse_records(stdout: &[u8]) -> Result<Vec<ExtractionRecord>> {
    let value: Value =
        serde_json::from_slice(stdout).context("Extractor output is not valid JSON")?;

    let Value::Array(items) = value else {
        return Err(anyhow!("Extractor output must be a JSON array"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(anyhow!(
                "Extractor output item {} is not an object: {}",
                i,
                other
            )),
        })
        .collect()
}

/// Resolves a program name the way a shell would: explicit paths are checked
/// as-is, bare names are searched on `PATH`.
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file())
}

/// Factory function to create the extractor for this process.
/// Falls back to the mock when no external program is configured or it cannot be found.
pub fn create_extractor(
    command: Option<&str>,
    args: &[String],
    mock_delay: Duration,
) -> Box<dyn PdfExtractor> {
    match command {
        Some(cmd) => match resolve_program(cmd) {
            Some(program) => Box::new(CommandExtractor::new(program, args.to_vec())),
            None => {
                tracing::warn!("Extractor '{}' not found, using MockExtractor", cmd);
                Box::new(MockExtractor::new(mock_delay))
            }
        },
        None => Box::new(MockExtractor::new(mock_delay)),
    }
}
