use anyhow::{Result, anyhow};
use std::path::Path;

/// Characters that never survive into a scratch file name
const RESERVED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', ';'];

/// Longest file name component we write to disk (bytes)
const MAX_FILENAME_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Lowercased extension with its leading dot, or an empty string.
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Checks the extension against the configured allow-list
pub fn validate_extension(filename: &str, allowed: &[String]) -> Result<()> {
    let ext = file_extension(filename);
    if !ext.is_empty() && allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) {
        return Ok(());
    }

    Err(anyhow!(ValidationError {
        code: "UNSUPPORTED_FORMAT",
        message: format!(
            "Unsupported file format. Allowed: {}",
            allowed.join(", ")
        ),
    }))
}

/// Sanitizes filename to prevent path traversal and injection attacks
/// Returns the sanitized filename or an error if the name is empty
pub fn sanitize_filename(filename: &str) -> Result<String> {
    // Only the last path component, whichever separator the client used
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename is missing".to_string(),
        }));
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control() || RESERVED_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Keep the tail so the extension survives truncation
    if sanitized.len() > MAX_FILENAME_LEN {
        let mut start = sanitized.len() - MAX_FILENAME_LEN;
        while !sanitized.is_char_boundary(start) {
            start += 1;
        }
        return Ok(sanitized[start..].to_string());
    }

    Ok(sanitized)
}

/// Full upload check: non-empty name and an allowed extension.
/// Returns the name that is safe to use as part of a scratch path.
pub fn validate_upload(filename: &str, allowed_extensions: &[String]) -> Result<String> {
    let sanitized = sanitize_filename(filename)?;
    validate_extension(&sanitized, allowed_extensions)?;
    Ok(sanitized)
}
