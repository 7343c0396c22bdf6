use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::info;

use crate::domain::errors::StorageError;
use crate::domain::image_sniff::SniffError;
use crate::domain::processed_covers::ProcessedCover;
use crate::domain::repositories::{CoverMetadataRepository, ObjectStorage};
use crate::domain::storage_refs::cover_object_path;
use crate::infrastructure::cover_encoding::{EncodeError, normalize_cover};

pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum CoverProcessingError {
    #[error("failed to download cover: {0}")]
    Download(String),
    #[error("unsupported cover image: {0}")]
    Unsupported(#[from] SniffError),
    #[error("failed to convert cover: {0}")]
    Encode(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CoverProcessingError {
    /// Whether the caller sent something unusable rather than the pipeline failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

impl From<EncodeError> for CoverProcessingError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::Sniff(err) => Self::Unsupported(err),
            EncodeError::Decode(message) => Self::Encode(message),
        }
    }
}

/// Downloads a cover, normalises it to WebP, stores it and records its metadata.
#[derive(Clone)]
pub struct CoverProcessor {
    http: Client,
    storage: Arc<dyn ObjectStorage>,
    metadata: Arc<dyn CoverMetadataRepository>,
    bucket: String,
}

impl CoverProcessor {
    pub fn new(
        http: Client,
        storage: Arc<dyn ObjectStorage>,
        metadata: Arc<dyn CoverMetadataRepository>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            http,
            storage,
            metadata,
            bucket: bucket.into(),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn process(
        &self,
        cover_url: &str,
        book_id: &str,
    ) -> Result<ProcessedCover, CoverProcessingError> {
        let original = self.download(cover_url).await?;
        let original_len = original.len();

        let encoded = tokio::task::spawn_blocking(move || normalize_cover(&original))
            .await
            .map_err(|e| CoverProcessingError::Encode(e.to_string()))??;

        let storage_path = cover_object_path(book_id, encoded.format.extension());
        let file_size = encoded.data.len() as u64;
        let public_url = self
            .storage
            .upload(
                &self.bucket,
                &storage_path,
                encoded.format.content_type(),
                encoded.data,
            )
            .await?;

        let cover = ProcessedCover {
            book_id: book_id.to_string(),
            storage_path,
            public_url,
            format: encoded.format,
            width: encoded.width,
            height: encoded.height,
            file_size,
            original_url: cover_url.to_string(),
        };
        self.metadata.upsert(&cover).await?;

        info!(
            book_id,
            original_bytes = original_len,
            stored_bytes = cover.file_size,
            width = cover.width,
            height = cover.height,
            "processed book cover"
        );
        Ok(cover)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, CoverProcessingError> {
        let response = self
            .http
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| CoverProcessingError::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoverProcessingError::Download(format!(
                "{url} returned status {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoverProcessingError::Download(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
