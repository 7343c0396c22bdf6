use std::sync::Arc;

use anyhow::Context;

use crate::application::services::CoverProcessor;
use crate::domain::storage_refs::BOOK_COVERS_BUCKET;
use crate::infrastructure::google_images::GoogleImageSearch;
use crate::infrastructure::rest::RestCoverMetadataRepository;
use crate::infrastructure::storage::{PlatformClient, PlatformStorage};

/// Everything that varies between production and test environments.
pub struct AppStateConfig {
    pub http_client: reqwest::Client,
    pub google_api_url: String,
    pub google_api_key: String,
    pub google_engine_id: String,
    pub storage_url: String,
    pub storage_key: String,
}

#[derive(Clone)]
pub struct AppState {
    pub image_search: Arc<GoogleImageSearch>,
    pub cover_processor: CoverProcessor,
}

impl AppState {
    pub fn new(config: AppStateConfig) -> anyhow::Result<Self> {
        let image_search = Arc::new(GoogleImageSearch::new(
            config.http_client.clone(),
            &config.google_api_url,
            &config.google_api_key,
            &config.google_engine_id,
        ));

        let platform = PlatformClient::with_client(
            &config.storage_url,
            config.storage_key,
            config.http_client.clone(),
        )
        .context("failed to configure storage platform client")?;

        let cover_processor = CoverProcessor::new(
            config.http_client,
            Arc::new(PlatformStorage::new(platform.clone())),
            Arc::new(RestCoverMetadataRepository::new(platform)),
            BOOK_COVERS_BUCKET,
        );

        Ok(Self {
            image_search,
            cover_processor,
        })
    }
}
