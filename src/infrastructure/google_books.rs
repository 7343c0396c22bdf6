use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::domain::covers::{BookQuery, CoverUrls};
use crate::domain::errors::SearchError;
use crate::domain::repositories::CoverSource;
use crate::infrastructure::google_images::GOOGLE_API_URL;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Google Books volumes API. Free, but its covers are small, so the
/// thumbnail link is upgraded before use.
#[derive(Clone)]
pub struct GoogleBooks {
    http: Client,
    base_url: String,
}

impl GoogleBooks {
    pub fn new(http: Client) -> Self {
        Self::with_url(http, GOOGLE_API_URL)
    }

    pub fn with_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    small_thumbnail: Option<String>,
    thumbnail: Option<String>,
}

fn volumes_query(book: &BookQuery) -> Option<String> {
    if let Some(isbn) = book.normalized_isbn() {
        return Some(format!("isbn:{isbn}"));
    }
    if book.title.is_empty() {
        return None;
    }
    let title = search_field("intitle", &book.title);
    Some(match book.author.as_deref() {
        Some(author) => format!("{title} {}", search_field("inauthor", author)),
        None => title,
    })
}

/// Multi-word values are quoted so the operator covers the whole phrase.
fn search_field(operator: &str, value: &str) -> String {
    let value = value.trim().replace('"', "");
    if value.contains(char::is_whitespace) {
        format!("{operator}:\"{value}\"")
    } else {
        format!("{operator}:{value}")
    }
}

/// Force https and drop the page-curl decoration Google adds to thumbnails.
fn clean_image_link(link: &str) -> String {
    let link = link.strip_prefix("http://").map_or_else(
        || link.to_string(),
        |rest| format!("https://{rest}"),
    );
    link.replace("&edge=curl", "")
}

fn cover_from_links(links: ImageLinks) -> Option<CoverUrls> {
    let thumbnail = links
        .thumbnail
        .as_deref()
        .or(links.small_thumbnail.as_deref())
        .map(clean_image_link)?;
    let cover = thumbnail.replace("zoom=1", "zoom=2");
    let small = links
        .small_thumbnail
        .as_deref()
        .map(clean_image_link)
        .unwrap_or(thumbnail);
    Some(CoverUrls::new(cover, Some(small)))
}

#[async_trait]
impl CoverSource for GoogleBooks {
    fn name(&self) -> &'static str {
        "google-books"
    }

    async fn find_cover(&self, book: &BookQuery) -> Result<CoverUrls, SearchError> {
        let Some(query) = volumes_query(book) else {
            return Ok(CoverUrls::empty());
        };

        let response = self
            .http
            .get(format!("{}/books/v1/volumes", self.base_url))
            .query(&[("q", query.as_str()), ("maxResults", "5")])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(SearchError::request)?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        let body: VolumesResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        Ok(body
            .items
            .into_iter()
            .filter_map(|volume| volume.volume_info?.image_links)
            .find_map(cover_from_links)
            .unwrap_or_default())
    }
}
