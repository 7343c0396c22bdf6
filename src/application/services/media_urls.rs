use std::sync::Arc;

use futures::future::join_all;
use tracing::warn;

use crate::domain::moments::{MomentRecord, SignedMoment};
use crate::domain::repositories::UrlSigner;
use crate::domain::storage_refs::resolve_path;

/// Turns stored video and thumbnail references into playable signed URLs.
///
/// Every failure degrades to `None` so screens can fall back to a placeholder.
#[derive(Clone)]
pub struct MediaUrlService {
    signer: Arc<dyn UrlSigner>,
    bucket: String,
}

impl MediaUrlService {
    pub fn new(signer: Arc<dyn UrlSigner>, bucket: impl Into<String>) -> Self {
        Self {
            signer,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub async fn get_signed_url(&self, reference: &str, expires_in_secs: u64) -> Option<String> {
        if reference.trim().is_empty() {
            return None;
        }

        let path = match resolve_path(reference, &self.bucket) {
            Ok(path) => path,
            Err(err) => {
                warn!(reference, bucket = %self.bucket, error = %err, "could not resolve storage path");
                return None;
            }
        };

        match self
            .signer
            .create_signed_url(&self.bucket, &path, expires_in_secs)
            .await
        {
            Ok(url) => Some(url),
            Err(err) => {
                warn!(path, bucket = %self.bucket, error = %err, "failed to create signed URL");
                None
            }
        }
    }

    async fn sign_optional(&self, reference: Option<&str>, expires_in_secs: u64) -> Option<String> {
        match reference {
            Some(reference) => self.get_signed_url(reference, expires_in_secs).await,
            None => None,
        }
    }

    /// Attach signed URLs to every moment, signing all of them concurrently.
    ///
    /// Output order matches input order. The video and thumbnail of a moment
    /// are signed independently, so one failing leaves the other intact.
    pub async fn process_moments_with_signed_urls(
        &self,
        moments: Vec<MomentRecord>,
        expires_in_secs: u64,
    ) -> Vec<SignedMoment> {
        let futures = moments.into_iter().map(|moment| async move {
            let (signed_video_url, signed_thumbnail_url) = tokio::join!(
                self.sign_optional(moment.video_url.as_deref(), expires_in_secs),
                self.sign_optional(moment.thumbnail_url.as_deref(), expires_in_secs),
            );
            SignedMoment {
                moment,
                signed_video_url,
                signed_thumbnail_url,
            }
        });

        join_all(futures).await
    }
}
