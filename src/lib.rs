pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::api::handlers::process::{
    ITEMS_COUNT_HEADER, PROCESSING_MODE_HEADER, PROCESSING_TIME_HEADER,
};
use crate::api::middleware::request_id::REQUEST_ID_HEADER;
use crate::config::AppConfig;
use crate::services::processing::ProcessingService;
use axum::{
    Router,
    http::{HeaderName, HeaderValue},
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PDF Data Extraction API",
        description = "Extracts structured line items from uploaded PDF documents"
    ),
    paths(
        api::handlers::health::health_check,
        api::handlers::health::get_config,
        api::handlers::process::process_pdf_sync,
        api::handlers::process::process_pdf,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::health::ConfigResponse,
            api::handlers::process::PdfUploadForm,
            models::ProcessingMode,
        )
    ),
    tags(
        (name = "system", description = "Health and configuration endpoints"),
        (name = "processing", description = "PDF extraction endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub processing: Arc<ProcessingService>,
}

impl AppState {
    pub fn new(config: AppConfig, extractor: Arc<dyn services::extractor::PdfExtractor>) -> Self {
        let processing = Arc::new(ProcessingService::new(config.clone(), extractor));
        Self { config, processing }
    }
}

pub fn create_app(state: AppState) -> Router {
    let process_routes = Router::new()
        .route(
            "/api/process-pdf-sync/",
            post(api::handlers::process::process_pdf_sync),
        )
        .route("/api/process-pdf/", post(api::handlers::process::process_pdf))
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_file_size + 10 * 1024 * 1024, // Add 10MB buffer for multipart overhead
        ));

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(api::handlers::health::health_check))
        .route("/api/config", get(api::handlers::health::get_config))
        .merge(process_routes)
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            HeaderName::from_static(PROCESSING_TIME_HEADER),
            HeaderName::from_static(ITEMS_COUNT_HEADER),
            HeaderName::from_static(PROCESSING_MODE_HEADER),
            REQUEST_ID_HEADER.clone(),
        ])
}
