use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::domain::errors::StorageError;
use crate::domain::repositories::{ObjectStorage, UrlSigner};

const USER_AGENT: &str = "TinyDreamers/1.0";

/// Connection details for the hosted storage/database platform.
#[derive(Clone)]
pub struct PlatformClient {
    base_url: Url,
    api_key: String,
    http: Client,
}

impl PlatformClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("failed to configure HTTP client")?;
        Self::with_client(base_url, api_key, http)
    }

    pub fn with_client(base_url: &str, api_key: impl Into<String>, http: Client) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid platform url: {base_url}"))?;
        let trimmed = base_url.path().trim_end_matches('/').to_string();
        base_url.set_path(&trimmed);

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }

    /// Build a request carrying the platform's API key headers.
    pub(crate) fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    pub(crate) async fn response_error(response: reqwest::Response) -> StorageError {
        let status = response.status().as_u16();
        let bytes = response.bytes().await.unwrap_or_default();

        let message = serde_json::from_slice::<PlatformErrorBody>(&bytes)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());

        StorageError::Status { status, message }
    }
}

#[derive(Debug, Deserialize)]
struct PlatformErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Percent-encode each segment of an object key, keeping the separators.
fn encode_object_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Object storage backed by the platform's storage REST API.
#[derive(Clone)]
pub struct PlatformStorage {
    client: PlatformClient,
    upload_timeout: Duration,
}

impl PlatformStorage {
    pub fn new(client: PlatformClient) -> Self {
        Self {
            client,
            upload_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: Option<String>,
}

#[async_trait]
impl UrlSigner for PlatformStorage {
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, StorageError> {
        let url = self.client.url(&format!(
            "/storage/v1/object/sign/{bucket}/{}",
            encode_object_path(path)
        ));

        let response = self
            .client
            .request(reqwest::Method::POST, &url)
            .json(&SignRequest {
                expires_in: expires_in_secs,
            })
            .send()
            .await
            .map_err(StorageError::request)?;

        if !response.status().is_success() {
            return Err(PlatformClient::response_error(response).await);
        }

        let body: SignResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        let signed = body
            .signed_url
            .filter(|s| !s.trim().is_empty())
            .ok_or(StorageError::MissingSignedUrl)?;

        if signed.starts_with("http") {
            return Ok(signed);
        }
        let signed = signed.trim_start_matches('/');
        Ok(self.client.url(&format!("/storage/v1/{signed}")))
    }
}

#[async_trait]
impl ObjectStorage for PlatformStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<String, StorageError> {
        let url = self.client.url(&format!(
            "/storage/v1/object/{bucket}/{}",
            encode_object_path(path)
        ));

        let response = self
            .client
            .request(reqwest::Method::POST, &url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .timeout(self.upload_timeout)
            .body(data)
            .send()
            .await
            .map_err(StorageError::request)?;

        if !response.status().is_success() {
            return Err(PlatformClient::response_error(response).await);
        }

        Ok(self.public_url(bucket, path))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.client.url(&format!(
            "/storage/v1/object/public/{bucket}/{}",
            encode_object_path(path)
        ))
    }
}
