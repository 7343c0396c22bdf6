use async_trait::async_trait;

use super::errors::{SearchError, StorageError};
use crate::domain::covers::{BookQuery, CoverSearchAttempt, CoverUrls};
use crate::domain::processed_covers::ProcessedCover;

/// Issues short-lived read URLs for private storage objects.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, StorageError>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload (or overwrite) an object and return its public URL.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<String, StorageError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}

#[async_trait]
pub trait CoverMetadataRepository: Send + Sync {
    async fn upsert(&self, cover: &ProcessedCover) -> Result<(), StorageError>;
}

/// The paid image search, one query and file type per call.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search(&self, attempt: &CoverSearchAttempt) -> Result<CoverUrls, SearchError>;
}

/// A free book metadata catalog that may know a cover for the book.
#[async_trait]
pub trait CoverSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn find_cover(&self, book: &BookQuery) -> Result<CoverUrls, SearchError>;
}
