use crate::AppState;
use crate::models::ProcessingMode;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub real_processing: bool,
    pub mode: ProcessingMode,
}

#[derive(Serialize, ToSchema)]
pub struct ConfigResponse {
    pub real_processing_available: bool,
    pub max_file_size_mb: usize,
    pub supported_formats: Vec<String>,
    pub mode: ProcessingMode,
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let mode = state.processing.mode();

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Local::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        real_processing: mode.is_real(),
        mode,
    })
}

#[utoipa::path(
    get,
    path = "/api/config",
    responses(
        (status = 200, description = "Upload limits and processing mode", body = ConfigResponse)
    ),
    tag = "system"
)]
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let mode = state.processing.mode();

    Json(ConfigResponse {
        real_processing_available: mode.is_real(),
        max_file_size_mb: state.config.max_file_size_mb(),
        supported_formats: state.config.allowed_extensions.clone(),
        mode,
    })
}
