use crate::AppState;
use crate::api::error::AppError;
use crate::models::ProcessingResult;
use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use utoipa::ToSchema;

pub const PROCESSING_TIME_HEADER: &str = "x-processing-time";
pub const ITEMS_COUNT_HEADER: &str = "x-items-count";
pub const PROCESSING_MODE_HEADER: &str = "x-processing-mode";

/// Multipart form accepted by the processing endpoints
#[derive(ToSchema)]
pub struct PdfUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

impl IntoResponse for ProcessingResult {
    fn into_response(self) -> Response {
        let headers = [
            (PROCESSING_TIME_HEADER, self.elapsed_header()),
            (ITEMS_COUNT_HEADER, self.items_count().to_string()),
            (PROCESSING_MODE_HEADER, self.mode.to_string()),
        ];
        (StatusCode::OK, headers, Json(self.records)).into_response()
    }
}

#[utoipa::path(
    post,
    path = "/api/process-pdf-sync/",
    request_body(content = PdfUploadForm, description = "PDF upload", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Extracted line items as a JSON array",
            headers(
                ("X-Processing-Time" = String, description = "Elapsed seconds, two decimals"),
                ("X-Items-Count" = usize, description = "Number of extracted records"),
                ("X-Processing-Mode" = String, description = "production or demo")
            )
        ),
        (status = 400, description = "Missing file name or unsupported format"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Storage or extraction failure")
    ),
    tag = "processing"
)]
pub async fn process_pdf_sync(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ProcessingResult, AppError> {
    // Capture errors so the rest of the body can be drained before responding
    let result: Result<ProcessingResult, AppError> = async {
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            let err_msg = e.to_string();
            if err_msg.contains("length limit exceeded") {
                AppError::PayloadTooLarge(
                    "Request body exceeds the maximum allowed limit".to_string(),
                )
            } else {
                AppError::InvalidInput(err_msg)
            }
        })? {
            if field.name() != Some("file") {
                continue;
            }

            // The declared content type is not trusted; the extension check decides
            let filename = field.file_name().unwrap_or_default().to_string();

            let body_with_io_error = field.map_err(std::io::Error::other);
            let reader = StreamReader::new(body_with_io_error);

            return state.processing.process(&filename, reader).await;
        }

        Err(AppError::InvalidInput("No file provided".to_string()))
    }
    .await;

    match result {
        Ok(res) => Ok(res),
        Err(e) => {
            // Consume the remaining multipart stream so the client sees our response
            // instead of a connection reset
            tracing::warn!("Processing failed: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}

/// Alias of `/api/process-pdf-sync/` for older clients
#[utoipa::path(
    post,
    path = "/api/process-pdf/",
    request_body(content = PdfUploadForm, description = "PDF upload", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Same as /api/process-pdf-sync/"),
        (status = 400, description = "Missing file name or unsupported format"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Storage or extraction failure")
    ),
    tag = "processing"
)]
pub async fn process_pdf(
    state: State<AppState>,
    multipart: Multipart,
) -> Result<ProcessingResult, AppError> {
    process_pdf_sync(state, multipart).await
}
