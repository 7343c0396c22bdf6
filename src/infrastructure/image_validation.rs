use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::domain::blank_images::BlankImageCache;
use crate::domain::clock::Clock;
use crate::domain::ttl_cache::TtlCache;

pub const HEAD_TIMEOUT: Duration = Duration::from_secs(5);
pub const MIN_IMAGE_BYTES: u64 = 500;

/// Checks whether an image URL is worth rendering.
///
/// The URL pattern check is free; [`ImageValidator::validate_image_url`] adds
/// one HEAD round trip on top of it. Both remember results for five minutes.
pub struct ImageValidator {
    http: Client,
    blank_cache: BlankImageCache,
    head_cache: TtlCache<bool>,
}

impl ImageValidator {
    pub fn new(http: Client, clock: Arc<dyn Clock>) -> Self {
        Self {
            http,
            blank_cache: BlankImageCache::new(Arc::clone(&clock)),
            head_cache: TtlCache::with_defaults(clock),
        }
    }

    pub fn is_likely_blank(&self, url: &str) -> bool {
        self.blank_cache.is_likely_blank(url)
    }

    pub async fn validate_image_url(&self, url: &str) -> bool {
        if self.is_likely_blank(url) {
            return false;
        }
        if let Some(valid) = self.head_cache.get(url) {
            return valid;
        }

        let valid = self.head_check(url).await;
        self.head_cache.insert(url, valid);
        valid
    }

    async fn head_check(&self, url: &str) -> bool {
        let response = match self.http.head(url).timeout(HEAD_TIMEOUT).send().await {
            Ok(r) => r,
            Err(err) => {
                debug!(url, error = %err, "image HEAD request failed");
                return false;
            }
        };

        if !response.status().is_success() {
            debug!(url, status = %response.status(), "image HEAD returned non-success");
            return false;
        }

        let headers = response.headers();
        let content_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !content_type.to_ascii_lowercase().starts_with("image/") {
            debug!(url, content_type, "image URL did not return an image");
            return false;
        }

        // A missing length says nothing either way
        let content_length = headers
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if let Some(length) = content_length
            && length < MIN_IMAGE_BYTES
        {
            debug!(url, length, "image too small to be a real cover");
            return false;
        }

        true
    }
}
