use async_trait::async_trait;

use crate::domain::errors::StorageError;
use crate::domain::processed_covers::ProcessedCover;
use crate::domain::repositories::CoverMetadataRepository;
use crate::infrastructure::storage::PlatformClient;

const BOOK_COVERS_TABLE: &str = "book_covers";

/// `book_covers` rows written through the platform's PostgREST endpoint.
#[derive(Clone)]
pub struct RestCoverMetadataRepository {
    client: PlatformClient,
}

impl RestCoverMetadataRepository {
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CoverMetadataRepository for RestCoverMetadataRepository {
    async fn upsert(&self, cover: &ProcessedCover) -> Result<(), StorageError> {
        let url = self
            .client
            .url(&format!("/rest/v1/{BOOK_COVERS_TABLE}?on_conflict=book_id"));

        let response = self
            .client
            .request(reqwest::Method::POST, &url)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(cover)
            .send()
            .await
            .map_err(StorageError::request)?;

        if !response.status().is_success() {
            return Err(PlatformClient::response_error(response).await);
        }

        Ok(())
    }
}
