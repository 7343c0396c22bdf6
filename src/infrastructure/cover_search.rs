use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::covers::{CoverSearchAttempt, CoverUrls, FileType};
use crate::domain::errors::SearchError;
use crate::domain::repositories::ImageSearch;

pub const QUOTA_EXCEEDED_CODE: &str = "QUOTA_EXCEEDED";
const QUOTA_REASONS: [&str; 4] = [
    QUOTA_EXCEEDED_CODE,
    "rateLimitExceeded",
    "quotaExceeded",
    "dailyLimitExceeded",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverSearchRequest<'a> {
    pub query: &'a str,
    pub file_type: FileType,
}

/// Paid image search reached through the `cover-search` serverless function.
#[derive(Clone)]
pub struct FunctionCoverSearch {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl FunctionCoverSearch {
    pub fn new(http: Client, functions_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            endpoint: format!("{}/cover-search", functions_url.trim_end_matches('/')),
            api_key,
        }
    }
}

#[async_trait]
impl ImageSearch for FunctionCoverSearch {
    async fn search(&self, attempt: &CoverSearchAttempt) -> Result<CoverUrls, SearchError> {
        let mut request = self.http.post(&self.endpoint).json(&CoverSearchRequest {
            query: &attempt.query,
            file_type: attempt.file_type,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(SearchError::request)?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::QuotaExceeded);
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(err) if status.is_success() => {
                return Err(SearchError::InvalidResponse(err.to_string()));
            }
            Err(_) => Value::Null,
        };

        if mentions_quota(&body) {
            return Err(SearchError::QuotaExceeded);
        }
        if !status.is_success() {
            debug!(status = status.as_u16(), body = %body, "cover search function failed");
            return Err(SearchError::Status(status.as_u16()));
        }

        serde_json::from_value(body).map_err(|e| SearchError::InvalidResponse(e.to_string()))
    }
}

/// Whether an error body carries one of the quota codes, at the top level
/// or anywhere inside its `details`.
pub fn mentions_quota(body: &Value) -> bool {
    let Some(object) = body.as_object() else {
        return false;
    };
    ["error", "details", "reason", "code"]
        .iter()
        .filter_map(|key| object.get(*key))
        .any(value_mentions_quota)
}

fn value_mentions_quota(value: &Value) -> bool {
    match value {
        Value::String(s) => QUOTA_REASONS.iter().any(|reason| s.contains(reason)),
        Value::Array(items) => items.iter().any(value_mentions_quota),
        Value::Object(map) => map.values().any(value_mentions_quota),
        _ => false,
    }
}
