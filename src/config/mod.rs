use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Process-wide configuration, fixed at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Scratch directory for uploaded PDFs (default: "temp_pdf_uploads")
    pub upload_dir: PathBuf,

    /// Base directory for per-request extractor output (default: "temp_pdf_outputs")
    pub output_base_dir: PathBuf,

    /// Maximum upload size in bytes (default: 50 MB)
    pub max_file_size: usize,

    /// Accepted file extensions, lowercase with leading dot (default: [".pdf"])
    pub allowed_extensions: Vec<String>,

    /// External extraction program. When unset or unresolvable the mock extractor is used.
    pub extractor_command: Option<String>,

    /// Extra arguments passed to the extraction program before the file path and output dir
    pub extractor_args: Vec<String>,

    /// Simulated processing time of the mock extractor, never zero (default: 2s)
    pub mock_delay: Duration,

    /// Scratch entries older than this are removed at startup (default: 24)
    pub scratch_cleanup_age_hours: u64,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,

    /// Bind address (default: "0.0.0.0")
    pub host: String,

    /// Bind port (default: 8000)
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("temp_pdf_uploads"),
            output_base_dir: PathBuf::from("temp_pdf_outputs"),
            max_file_size: 50 * 1024 * 1024, // 50 MB
            allowed_extensions: vec![".pdf".to_string()],
            extractor_command: None,
            extractor_args: Vec::new(),
            mock_delay: Duration::from_millis(2000),
            scratch_cleanup_age_hours: 24,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:9002".to_string(),
            ],
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Unset or unparsable
    /// values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        Self {
            upload_dir: lookup("TEMP_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),

            output_base_dir: lookup("TEMP_OUTPUT_DIR_BASE")
                .map(PathBuf::from)
                .unwrap_or(default.output_base_dir),

            max_file_size: lookup("MAX_FILE_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            allowed_extensions: lookup("ALLOWED_EXTENSIONS")
                .map(|v| parse_extensions(&v))
                .filter(|exts| !exts.is_empty())
                .unwrap_or(default.allowed_extensions),

            extractor_command: lookup("EXTRACTOR_COMMAND")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),

            extractor_args: lookup("EXTRACTOR_ARGS")
                .map(|v| v.split_whitespace().map(str::to_string).collect())
                .unwrap_or(default.extractor_args),

            mock_delay: lookup("MOCK_DELAY_MS")
                .and_then(|v| v.parse().ok())
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(default.mock_delay),

            scratch_cleanup_age_hours: lookup("SCRATCH_CLEANUP_AGE_HOURS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.scratch_cleanup_age_hours),

            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(default.allowed_origins),

            host: lookup("HOST").unwrap_or(default.host),

            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),
        }
    }

    /// Create config for development and tests (short mock delay)
    pub fn development() -> Self {
        Self {
            mock_delay: Duration::from_millis(50),
            ..Self::default()
        }
    }

    pub fn max_file_size_mb(&self) -> usize {
        self.max_file_size / 1024 / 1024
    }
}

/// Normalizes a comma separated extension list to lowercase ".ext" entries.
fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .map(|s| format!(".{}", s))
        .collect()
}
