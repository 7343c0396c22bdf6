use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use crate::domain::video_trim::{TrimError, VideoTrimmer, trimmed_output_path, validate_range};

/// Keep only the tail of ffmpeg's stderr in error messages.
const MAX_STDERR_CHARS: usize = 2048;

/// Trims moments by stream-copying the selected range with an ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegTrimmer {
    ffmpeg_path: PathBuf,
}

impl FfmpegTrimmer {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

impl Default for FfmpegTrimmer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl VideoTrimmer for FfmpegTrimmer {
    #[tracing::instrument(skip(self))]
    async fn trim(
        &self,
        input: &Path,
        start_secs: f64,
        end_secs: f64,
    ) -> Result<PathBuf, TrimError> {
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(TrimError::FileNotFound(input.to_path_buf()));
        }
        validate_range(start_secs, end_secs)?;

        let output = trimmed_output_path(input, start_secs, end_secs);

        let result = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .args(["-ss", &format!("{start_secs:.3}")])
            .args(["-to", &format!("{end_secs:.3}")])
            .arg("-i")
            .arg(input)
            .args(["-c", "copy", "-movflags", "+faststart"])
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TrimError::ExportFailed(format!("failed to run ffmpeg: {e}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: String = stderr
                .chars()
                .rev()
                .take(MAX_STDERR_CHARS)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            warn!(code = ?result.status.code(), "ffmpeg trim failed");
            return Err(TrimError::ExportFailed(tail.trim().to_string()));
        }

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(TrimError::ExportFailed(
                "ffmpeg reported success but wrote no output".to_string(),
            ));
        }

        info!(output = %output.display(), "trimmed moment video");
        Ok(output)
    }
}
