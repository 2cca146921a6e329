use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::models::{ProcessingMode, ProcessingResult};
use crate::services::extractor::PdfExtractor;
use crate::services::scratch::{ScratchSpace, WriteOutcome};
use crate::utils::validation::{ValidationError, validate_upload};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncRead;

/// Runs one upload through validate → stage → extract, releasing scratch space
/// on every path out.
pub struct ProcessingService {
    config: AppConfig,
    extractor: Arc<dyn PdfExtractor>,
    mode: ProcessingMode,
}

impl ProcessingService {
    pub fn new(config: AppConfig, extractor: Arc<dyn PdfExtractor>) -> Self {
        let mode = extractor.mode();
        Self {
            config,
            extractor,
            mode,
        }
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    /// Pure check on the client supplied file name. Returns the sanitized name.
    pub fn validate(&self, filename: &str) -> Result<String, AppError> {
        validate_upload(filename, &self.config.allowed_extensions).map_err(|e| {
            let message = match e.downcast_ref::<ValidationError>() {
                Some(v) => v.message.clone(),
                None => e.to_string(),
            };
            AppError::InvalidInput(message)
        })
    }

    /// Validates, stages and extracts a single upload.
    pub async fn process<R>(&self, filename: &str, reader: R) -> Result<ProcessingResult, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let safe_name = self.validate(filename)?;

        let scratch = ScratchSpace::create(
            &self.config.upload_dir,
            &self.config.output_base_dir,
            &safe_name,
        )
        .await?;

        tracing::info!(
            "Received file for processing: {} (mode: {}, id: {})",
            safe_name,
            self.mode,
            scratch.id()
        );

        let started = Instant::now();
        let result = self.stage_and_extract(&scratch, reader).await;
        scratch.release().await;

        let records = result?;
        let elapsed = started.elapsed();

        tracing::info!(
            "Processing finished in {:.2}s, extracted {} records",
            elapsed.as_secs_f64(),
            records.len()
        );

        Ok(ProcessingResult {
            records,
            elapsed,
            mode: self.mode,
        })
    }

    async fn stage_and_extract<R>(
        &self,
        scratch: &ScratchSpace,
        reader: R,
    ) -> Result<Vec<crate::models::ExtractionRecord>, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let max = self.config.max_file_size as u64;
        match scratch.write_from(reader, max).await? {
            WriteOutcome::Written(size) => {
                tracing::info!("File saved: {} ({} bytes)", scratch.file_path().display(), size);
            }
            WriteOutcome::TooLarge => {
                return Err(AppError::PayloadTooLarge(format!(
                    "File exceeds the maximum allowed size of {} MB",
                    self.config.max_file_size_mb()
                )));
            }
        }

        self.extractor
            .extract(scratch.file_path(), scratch.output_dir())
            .await
            .map_err(|e| AppError::Processing(format!("{:#}", e)))
    }
}
