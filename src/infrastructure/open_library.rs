use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::domain::covers::{BookQuery, CoverUrls};
use crate::domain::errors::SearchError;
use crate::domain::repositories::CoverSource;

pub const OPEN_LIBRARY_URL: &str = "https://openlibrary.org";
pub const OPEN_LIBRARY_COVERS_URL: &str = "https://covers.openlibrary.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Open Library search, looked up by ISBN when known and by title/author otherwise.
#[derive(Clone)]
pub struct OpenLibrary {
    http: Client,
    base_url: String,
    covers_url: String,
}

impl OpenLibrary {
    pub fn new(http: Client) -> Self {
        Self::with_urls(http, OPEN_LIBRARY_URL, OPEN_LIBRARY_COVERS_URL)
    }

    pub fn with_urls(http: Client, base_url: &str, covers_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            covers_url: covers_url.trim_end_matches('/').to_string(),
        }
    }

    fn cover_urls(&self, cover_id: i64) -> CoverUrls {
        CoverUrls::new(
            format!("{}/b/id/{cover_id}-L.jpg", self.covers_url),
            Some(format!("{}/b/id/{cover_id}-M.jpg", self.covers_url)),
        )
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    cover_i: Option<i64>,
}

#[async_trait]
impl CoverSource for OpenLibrary {
    fn name(&self) -> &'static str {
        "open-library"
    }

    async fn find_cover(&self, book: &BookQuery) -> Result<CoverUrls, SearchError> {
        let mut params: Vec<(&str, String)> = match book.normalized_isbn() {
            Some(isbn) => vec![("isbn", isbn)],
            None if !book.title.is_empty() => {
                let mut params = vec![("title", book.title.clone())];
                if let Some(author) = &book.author {
                    params.push(("author", author.clone()));
                }
                params
            }
            None => return Ok(CoverUrls::empty()),
        };
        params.push(("fields", "cover_i".to_string()));
        params.push(("limit", "1".to_string()));

        let response = self
            .http
            .get(format!("{}/search.json", self.base_url))
            .query(&params)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(SearchError::request)?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        Ok(body
            .docs
            .iter()
            .find_map(|doc| doc.cover_i.filter(|id| *id > 0))
            .map(|id| self.cover_urls(id))
            .unwrap_or_default())
    }
}
