use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TrimError {
    #[error("video file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("invalid trim range {start}s..{end}s")]
    InvalidRange { start: f64, end: f64 },
    #[error("video export failed: {0}")]
    ExportFailed(String),
}

/// Cuts a recorded moment down to the selected range.
#[async_trait]
pub trait VideoTrimmer: Send + Sync {
    /// Returns the path of the trimmed copy; the input is left untouched.
    async fn trim(&self, input: &Path, start_secs: f64, end_secs: f64)
    -> Result<PathBuf, TrimError>;
}

pub fn validate_range(start_secs: f64, end_secs: f64) -> Result<(), TrimError> {
    let valid = start_secs.is_finite()
        && end_secs.is_finite()
        && start_secs >= 0.0
        && end_secs > start_secs;
    if valid {
        Ok(())
    } else {
        Err(TrimError::InvalidRange {
            start: start_secs,
            end: end_secs,
        })
    }
}

/// Output path for a trimmed copy, placed next to the input.
pub fn trimmed_output_path(input: &Path, start_secs: f64, end_secs: f64) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("moment");
    let start_ms = (start_secs * 1000.0).round() as u64;
    let end_ms = (end_secs * 1000.0).round() as u64;
    input.with_file_name(format!("{stem}_trimmed_{start_ms}_{end_ms}.mp4"))
}
