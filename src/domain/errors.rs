use thiserror::Error;

/// Failure to map a stored media reference back to a bare object path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid storage URL: {0}")]
    InvalidUrl(String),
    #[error("URL does not reference bucket {bucket}: {url}")]
    UnrecognizedUrl { url: String, bucket: String },
    #[error("storage reference resolves to an empty path")]
    EmptyPath,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Request(String),
    #[error("storage platform returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("storage platform response did not include a signed URL")]
    MissingSignedUrl,
    #[error("unexpected storage response: {0}")]
    InvalidResponse(String),
}

impl StorageError {
    pub fn request(err: impl std::fmt::Display) -> Self {
        Self::Request(err.to_string())
    }
}

/// Outcome of a single cover search call that did not produce a result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("image search quota exceeded")]
    QuotaExceeded,
    #[error("search request failed: {0}")]
    Request(String),
    #[error("search API returned status {0}")]
    Status(u16),
    #[error("unexpected search response: {0}")]
    InvalidResponse(String),
}

impl SearchError {
    pub fn request(err: impl std::fmt::Display) -> Self {
        Self::Request(err.to_string())
    }
}
