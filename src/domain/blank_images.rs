use std::sync::Arc;

use url::Url;

use super::clock::Clock;
use super::ttl_cache::TtlCache;

const BLANK_URL_MARKERS: [&str; 7] = [
    "no-cover",
    "nocover",
    "placeholder",
    "1x1",
    "blank",
    "spacer",
    "transparent",
];

const SIZE_PARAMS: [&str; 5] = ["w", "h", "width", "height", "size"];

/// Guess from the URL alone whether it points at a placeholder or empty image.
///
/// Matching is case-insensitive. A size query parameter set to zero also
/// counts, as does an empty URL.
pub fn is_likely_blank_image(url: &str) -> bool {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return true;
    }

    let lower = trimmed.to_ascii_lowercase();
    if BLANK_URL_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return true;
    }

    Url::parse(&lower).is_ok_and(|parsed| {
        parsed
            .query_pairs()
            .any(|(key, value)| SIZE_PARAMS.contains(&key.as_ref()) && value == "0")
    })
}

/// [`is_likely_blank_image`] with results remembered per URL for a few minutes.
pub struct BlankImageCache {
    cache: TtlCache<bool>,
}

impl BlankImageCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: TtlCache::with_defaults(clock),
        }
    }

    pub fn from_cache(cache: TtlCache<bool>) -> Self {
        Self { cache }
    }

    pub fn is_likely_blank(&self, url: &str) -> bool {
        self.cache
            .get_or_insert_with(url, || is_likely_blank_image(url))
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
