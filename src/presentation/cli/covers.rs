use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::{ClientConfig, http_client, print_json};
use crate::application::services::CoverPipeline;
use crate::domain::blank_images::BlankImageCache;
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::covers::CoverUrls;
use crate::domain::quota::QuotaState;
use crate::domain::repositories::CoverSource;
use crate::infrastructure::cover_search::FunctionCoverSearch;
use crate::infrastructure::google_books::GoogleBooks;
use crate::infrastructure::image_validation::ImageValidator;
use crate::infrastructure::open_library::OpenLibrary;

#[derive(Debug, Args)]
pub struct CoverCommand {
    #[arg(long)]
    pub isbn: Option<String>,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub author: Option<String>,
    /// Also check that the cover URL serves a real image
    #[arg(long)]
    pub validate: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CoverOutput {
    #[serde(flatten)]
    urls: CoverUrls,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid: Option<bool>,
}

pub async fn find_cover(config: &ClientConfig, command: CoverCommand) -> Result<()> {
    let http = http_client()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let paid = FunctionCoverSearch::new(
        http.clone(),
        &config.functions_url()?,
        config.function_token(),
    );
    let free_sources: Vec<Arc<dyn CoverSource>> = vec![
        Arc::new(OpenLibrary::new(http.clone())),
        Arc::new(GoogleBooks::new(http.clone())),
    ];
    let pipeline = CoverPipeline::new(
        Arc::new(paid),
        free_sources,
        Arc::new(QuotaState::new(Arc::clone(&clock))),
        Arc::new(BlankImageCache::new(Arc::clone(&clock))),
    );

    let urls = pipeline
        .get_best_cover_url(
            command.isbn.as_deref(),
            &command.title,
            command.author.as_deref(),
        )
        .await;

    let valid = match (&urls.cover_url, command.validate) {
        (Some(url), true) => Some(ImageValidator::new(http, clock).validate_image_url(url).await),
        (None, true) => Some(false),
        (_, false) => None,
    };

    print_json(&CoverOutput { urls, valid })
}

#[derive(Debug, Args)]
pub struct ProcessCoverCommand {
    #[arg(long)]
    pub book_id: String,
    #[arg(long)]
    pub cover_url: String,
}

pub async fn process_cover(config: &ClientConfig, command: ProcessCoverCommand) -> Result<()> {
    let client = config.functions_client()?;
    let cover = client
        .process_cover(&command.book_id, &command.cover_url)
        .await?;
    print_json(&cover)
}
