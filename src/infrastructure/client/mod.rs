use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::application::routes::process_cover::{ProcessCoverRequest, ProcessCoverResponse};
use crate::domain::processed_covers::ProcessedCover;

/// Client for the serverless functions, used by the CLI.
pub struct FunctionsClient {
    base_url: Url,
    http: Client,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl FunctionsClient {
    pub fn new(base_url: Url, token: Option<String>) -> Result<Self> {
        let mut normalized = base_url;
        if !normalized.path().ends_with('/') {
            normalized.set_path(&format!("{}/", normalized.path().trim_end_matches('/')));
        }

        let http = Client::builder()
            .user_agent("tinydreamers-cli/1.0")
            .build()
            .context("failed to configure HTTP client")?;

        Ok(Self {
            base_url: normalized,
            http,
            token,
        })
    }

    pub fn from_base_url(base_url: &str, token: Option<String>) -> Result<Self> {
        let url =
            Url::parse(base_url).with_context(|| format!("invalid functions url: {base_url}"))?;
        Self::new(url, token)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid function path: {path}"))
    }

    /// Attach the bearer token when one was configured.
    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let mut request = self.http.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    pub async fn process_cover(&self, book_id: &str, cover_url: &str) -> Result<ProcessedCover> {
        let url = self.endpoint("process-cover")?;
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&ProcessCoverRequest {
                cover_url: cover_url.to_string(),
                book_id: book_id.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::response_error(response).await);
        }

        let body: ProcessCoverResponse = response
            .json()
            .await
            .context("failed to deserialize response body")?;

        match body {
            ProcessCoverResponse {
                success: true,
                cover: Some(cover),
                ..
            } => Ok(cover),
            ProcessCoverResponse { error, .. } => Err(anyhow!(
                "cover processing failed: {}",
                error.unwrap_or_else(|| "unknown error".to_string())
            )),
        }
    }

    async fn response_error(response: reqwest::Response) -> anyhow::Error {
        let status = response.status();
        let bytes = response.bytes().await.unwrap_or_default();

        if let Ok(ErrorBody {
            error: Some(message),
        }) = serde_json::from_slice::<ErrorBody>(&bytes)
        {
            return anyhow!("request failed ({status}): {message}");
        }

        let message = String::from_utf8_lossy(&bytes);
        anyhow!("request failed ({status}): {message}")
    }
}
