use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::blank_images::BlankImageCache;
use crate::domain::covers::{BookQuery, CoverUrls};
use crate::domain::errors::SearchError;
use crate::domain::fallback::{Attempt, first_found};
use crate::domain::quota::QuotaState;
use crate::domain::repositories::{CoverSource, ImageSearch};

/// Finds the best available cover for a book.
///
/// The paid image search is tried first with progressively broader queries,
/// unless its quota was exhausted within the cooldown window. The free
/// catalogs are the fallback, in the order given.
pub struct CoverPipeline {
    paid_search: Arc<dyn ImageSearch>,
    free_sources: Vec<Arc<dyn CoverSource>>,
    quota: Arc<QuotaState>,
    blank_images: Arc<BlankImageCache>,
}

impl CoverPipeline {
    pub fn new(
        paid_search: Arc<dyn ImageSearch>,
        free_sources: Vec<Arc<dyn CoverSource>>,
        quota: Arc<QuotaState>,
        blank_images: Arc<BlankImageCache>,
    ) -> Self {
        Self {
            paid_search,
            free_sources,
            quota,
            blank_images,
        }
    }

    pub fn quota(&self) -> &QuotaState {
        &self.quota
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_best_cover_url(
        &self,
        isbn: Option<&str>,
        title: &str,
        author: Option<&str>,
    ) -> CoverUrls {
        let book = BookQuery::new(isbn, title, author);

        if self.quota.is_exceeded() {
            debug!("image search quota exceeded recently; skipping paid search");
        } else if let Some(found) = self.search_paid(&book).await {
            return found;
        }

        self.search_free(&book).await.unwrap_or_default()
    }

    async fn search_paid(&self, book: &BookQuery) -> Option<CoverUrls> {
        first_found(book.search_attempts(), |attempt| async move {
            match self.paid_search.search(&attempt).await {
                Ok(urls) if self.is_usable(&urls) => {
                    info!(query = %attempt.query, file_type = %attempt.file_type, "found cover via image search");
                    Attempt::Found(urls)
                }
                Ok(_) => Attempt::Miss,
                Err(SearchError::QuotaExceeded) => {
                    warn!("image search quota exceeded; falling back to free catalogs");
                    self.quota.mark_exceeded();
                    Attempt::Stop
                }
                Err(err) => {
                    warn!(query = %attempt.query, file_type = %attempt.file_type, error = %err, "image search attempt failed");
                    Attempt::Miss
                }
            }
        })
        .await
    }

    async fn search_free(&self, book: &BookQuery) -> Option<CoverUrls> {
        first_found(self.free_sources.iter(), |source| async move {
            match source.find_cover(book).await {
                Ok(urls) if self.is_usable(&urls) => {
                    info!(source = source.name(), "found cover via catalog");
                    Attempt::Found(urls)
                }
                Ok(_) => Attempt::Miss,
                Err(err) => {
                    warn!(source = source.name(), error = %err, "catalog cover lookup failed");
                    Attempt::Miss
                }
            }
        })
        .await
    }

    fn is_usable(&self, urls: &CoverUrls) -> bool {
        urls.cover_url
            .as_deref()
            .is_some_and(|url| urls.has_cover() && !self.blank_images.is_likely_blank(url))
    }
}
