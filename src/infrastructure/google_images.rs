use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::covers::{CoverSearchAttempt, CoverUrls};
use crate::domain::errors::SearchError;
use crate::domain::repositories::ImageSearch;
use crate::infrastructure::cover_search::mentions_quota;

pub const GOOGLE_API_URL: &str = "https://www.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum GoogleSearchError {
    #[error("Google image search quota exceeded")]
    QuotaExceeded { message: String, details: Value },
    #[error("Google image search returned status {status}")]
    Upstream { status: u16, details: Value },
    #[error("Google image search request failed: {0}")]
    Request(String),
    #[error("unexpected Google image search response: {0}")]
    InvalidResponse(String),
}

/// Google Custom Search JSON API in image mode; the paid API behind the
/// cover search function.
#[derive(Clone)]
pub struct GoogleImageSearch {
    http: Client,
    base_url: String,
    api_key: String,
    engine_id: String,
}

impl GoogleImageSearch {
    pub fn new(http: Client, base_url: &str, api_key: &str, engine_id: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            engine_id: engine_id.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.engine_id.is_empty()
    }

    pub async fn search_images(
        &self,
        attempt: &CoverSearchAttempt,
    ) -> Result<CoverUrls, GoogleSearchError> {
        let url = format!("{}/customsearch/v1", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", attempt.query.as_str()),
                ("searchType", "image"),
                ("fileType", attempt.file_type.as_str()),
                ("imgSize", "large"),
                ("safe", "active"),
                ("num", "1"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| GoogleSearchError::Request(e.to_string()))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status == StatusCode::TOO_MANY_REQUESTS || mentions_quota(&body) {
            let message = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("Daily image search quota exceeded")
                .to_string();
            return Err(GoogleSearchError::QuotaExceeded {
                message,
                details: body,
            });
        }

        if !status.is_success() {
            return Err(GoogleSearchError::Upstream {
                status: status.as_u16(),
                details: body,
            });
        }

        let results: SearchResponse = serde_json::from_value(body)
            .map_err(|e| GoogleSearchError::InvalidResponse(e.to_string()))?;
        Ok(results.into_cover_urls())
    }
}

#[async_trait]
impl ImageSearch for GoogleImageSearch {
    async fn search(&self, attempt: &CoverSearchAttempt) -> Result<CoverUrls, SearchError> {
        self.search_images(attempt).await.map_err(|err| match err {
            GoogleSearchError::QuotaExceeded { .. } => SearchError::QuotaExceeded,
            GoogleSearchError::Upstream { status, .. } => SearchError::Status(status),
            GoogleSearchError::Request(msg) => SearchError::Request(msg),
            GoogleSearchError::InvalidResponse(msg) => SearchError::InvalidResponse(msg),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: Option<String>,
    image: Option<ItemImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemImage {
    thumbnail_link: Option<String>,
}

impl SearchResponse {
    fn into_cover_urls(self) -> CoverUrls {
        self.items
            .into_iter()
            .find_map(|item| {
                let link = item.link.filter(|l| !l.trim().is_empty())?;
                let thumbnail = item.image.and_then(|image| image.thumbnail_link);
                Some(CoverUrls::new(link, thumbnail))
            })
            .unwrap_or_default()
    }
}
