use crate::config::AppConfig;
use crate::models::ProcessingMode;
use crate::services::extractor::PdfExtractor;
use std::sync::Arc;
use tracing::info;

pub async fn setup_extractor(config: &AppConfig) -> Arc<dyn PdfExtractor> {
    let extractor = crate::services::extractor::create_extractor(
        config.extractor_command.as_deref(),
        &config.extractor_args,
        config.mock_delay,
    );

    match extractor.mode() {
        ProcessingMode::Production => {
            if extractor.health_check().await {
                info!("✅ External PDF extractor available, running in production mode");
            } else {
                tracing::warn!(
                    "⚠️  External PDF extractor failed its health check; requests may fail."
                );
            }
        }
        ProcessingMode::Demo => {
            tracing::warn!("⚠️  No external PDF extractor configured");
            info!("🔄 Using mock extraction (demo mode, sample data only)");
            info!("ℹ️  Set EXTRACTOR_COMMAND to a program that prints a JSON array to enable real processing");
        }
    }

    extractor.into()
}
