use crate::api::error::AppError;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

/// Per-request scratch file and output directory, both namespaced by a random id.
///
/// Call [`ScratchSpace::release`] once the request is done. If the guard is
/// dropped without it (cancelled request, panic) the paths are removed
/// synchronously in `Drop`. Removal failures are logged and never returned.
#[derive(Debug)]
pub struct ScratchSpace {
    id: Uuid,
    file_path: PathBuf,
    output_dir: PathBuf,
    released: bool,
}

/// Outcome of writing an upload into scratch
#[derive(Debug)]
pub enum WriteOutcome {
    Written(u64),
    TooLarge,
}

impl ScratchSpace {
    /// Reserves fresh paths and creates the output directory.
    pub async fn create(
        upload_dir: &Path,
        output_base_dir: &Path,
        filename: &str,
    ) -> Result<Self, AppError> {
        let id = Uuid::new_v4();
        let scratch = Self {
            id,
            file_path: upload_dir.join(format!("{}_{}", id, filename)),
            output_dir: output_base_dir.join(id.to_string()),
            released: false,
        };

        // The guard already owns the paths, so a failure below still cleans up.
        tokio::fs::create_dir_all(upload_dir).await?;
        tokio::fs::create_dir_all(&scratch.output_dir).await?;

        Ok(scratch)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Streams `reader` into the scratch file, stopping once more than
    /// `max_bytes` have arrived.
    pub async fn write_from<R>(&self, reader: R, max_bytes: u64) -> Result<WriteOutcome, AppError>
    where
        R: AsyncRead + Unpin,
    {
        let mut file = tokio::fs::File::create(&self.file_path).await?;
        let mut limited = reader.take(max_bytes.saturating_add(1));
        let written = tokio::io::copy(&mut limited, &mut file).await?;
        file.flush().await?;

        if written > max_bytes {
            return Ok(WriteOutcome::TooLarge);
        }
        Ok(WriteOutcome::Written(written))
    }

    /// Removes the scratch file and output directory. Best effort.
    pub async fn release(mut self) {
        self.released = true;

        report_removal(
            "file",
            &self.file_path,
            tokio::fs::remove_file(&self.file_path).await,
        );
        report_removal(
            "folder",
            &self.output_dir,
            tokio::fs::remove_dir_all(&self.output_dir).await,
        );
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        tracing::warn!("Scratch space {} dropped without release, cleaning up", self.id);
        report_removal("file", &self.file_path, std::fs::remove_file(&self.file_path));
        report_removal("folder", &self.output_dir, std::fs::remove_dir_all(&self.output_dir));
    }
}

fn report_removal(kind: &str, path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => tracing::info!("Temporary {} removed: {}", kind, path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove temporary {} {}: {}", kind, path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Roots {
        _tmp: TempDir,
        uploads: PathBuf,
        outputs: PathBuf,
    }

    fn roots() -> Roots {
        let tmp = TempDir::new().unwrap();
        let uploads = tmp.path().join("uploads");
        let outputs = tmp.path().join("outputs");
        Roots {
            _tmp: tmp,
            uploads,
            outputs,
        }
    }

    #[tokio::test]
    async fn test_create_write_release() {
        let r = roots();
        let scratch = ScratchSpace::create(&r.uploads, &r.outputs, "report.pdf")
            .await
            .unwrap();

        assert!(scratch.output_dir().is_dir());
        assert!(
            scratch
                .file_path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .ends_with("_report.pdf")
        );

        let outcome = scratch
            .write_from(&b"%PDF-1.7 body"[..], 1024)
            .await
            .unwrap();
        assert!(matches!(outcome, WriteOutcome::Written(13)));
        assert_eq!(
            std::fs::read(scratch.file_path()).unwrap(),
            b"%PDF-1.7 body"
        );

        std::fs::write(scratch.output_dir().join("page-1.png"), b"x").unwrap();

        let file = scratch.file_path().to_path_buf();
        let out = scratch.output_dir().to_path_buf();
        scratch.release().await;

        assert!(!file.exists());
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_write_rejects_oversized_upload() {
        let r = roots();
        let scratch = ScratchSpace::create(&r.uploads, &r.outputs, "big.pdf")
            .await
            .unwrap();

        let outcome = scratch.write_from(&[0u8; 64][..], 63).await.unwrap();
        assert!(matches!(outcome, WriteOutcome::TooLarge));

        let outcome = scratch.write_from(&[0u8; 64][..], 64).await.unwrap();
        assert!(matches!(outcome, WriteOutcome::Written(64)));
    }

    #[tokio::test]
    async fn test_release_without_file_is_quiet() {
        let r = roots();
        let scratch = ScratchSpace::create(&r.uploads, &r.outputs, "never-written.pdf")
            .await
            .unwrap();
        let out = scratch.output_dir().to_path_buf();
        scratch.release().await;
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_drop_cleans_up() {
        let r = roots();
        let scratch = ScratchSpace::create(&r.uploads, &r.outputs, "report.pdf")
            .await
            .unwrap();
        scratch.write_from(&b"data"[..], 1024).await.unwrap();

        let file = scratch.file_path().to_path_buf();
        let out = scratch.output_dir().to_path_buf();
        drop(scratch);

        assert!(!file.exists());
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_concurrent_spaces_are_disjoint() {
        let r = roots();
        let (a, b) = tokio::join!(
            ScratchSpace::create(&r.uploads, &r.outputs, "report.pdf"),
            ScratchSpace::create(&r.uploads, &r.outputs, "report.pdf"),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.id(), b.id());
        assert_ne!(a.file_path(), b.file_path());
        assert_ne!(a.output_dir(), b.output_dir());

        a.release().await;
        b.release().await;
    }
}
