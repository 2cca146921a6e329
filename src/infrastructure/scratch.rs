use crate::config::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::info;

/// Creates both scratch roots and removes entries left behind by a previous
/// run that died before cleanup.
pub async fn setup_scratch_dirs(config: &AppConfig) -> Result<()> {
    for dir in [&config.upload_dir, &config.output_base_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create scratch directory {}", dir.display()))?;
    }

    let max_age = Duration::from_secs(config.scratch_cleanup_age_hours.saturating_mul(3600));
    let mut removed = 0;
    for dir in [&config.upload_dir, &config.output_base_dir] {
        removed += sweep_stale_entries(dir, max_age).await?;
    }

    info!(
        "📁 Scratch directories ready: uploads={}, outputs={} ({} stale entries removed)",
        config.upload_dir.display(),
        config.output_base_dir.display(),
        removed
    );
    Ok(())
}

/// Deletes direct children of `dir` whose modification time is older than `max_age`.
pub async fn sweep_stale_entries(dir: &Path, max_age: Duration) -> Result<usize> {
    let now = SystemTime::now();
    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let metadata = match entry.metadata().await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age < max_age {
            continue;
        }

        let path = entry.path();
        let result = if metadata.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };

        match result {
            Ok(()) => {
                tracing::debug!("Removed stale scratch entry {}", path.display());
                removed += 1;
            }
            Err(e) => tracing::warn!("Failed to remove stale entry {}: {}", path.display(), e),
        }
    }

    Ok(removed)
}
