use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;

use super::{ClientConfig, http_client, print_json};
use crate::application::services::MediaUrlService;
use crate::domain::moments::MomentRecord;
use crate::domain::storage_refs::{DEFAULT_SIGNED_URL_EXPIRY_SECS, VIDEO_MOMENTS_BUCKET};
use crate::domain::video_trim::VideoTrimmer;
use crate::infrastructure::ffmpeg_trim::FfmpegTrimmer;
use crate::infrastructure::storage::PlatformStorage;

#[derive(Debug, Args)]
pub struct SignCommand {
    /// Bare object path or full storage URL
    pub reference: String,
    #[arg(long, default_value = VIDEO_MOMENTS_BUCKET)]
    pub bucket: String,
    #[arg(long, default_value_t = DEFAULT_SIGNED_URL_EXPIRY_SECS)]
    pub expires_in: u64,
}

#[derive(Debug, Args)]
pub struct MomentsCommand {
    /// JSON file holding an array of moment rows
    pub file: PathBuf,
    #[arg(long, default_value_t = DEFAULT_SIGNED_URL_EXPIRY_SECS)]
    pub expires_in: u64,
}

#[derive(Debug, Args)]
pub struct TrimCommand {
    pub input: PathBuf,
    /// Start of the kept range, in seconds
    #[arg(long)]
    pub start: f64,
    /// End of the kept range, in seconds
    #[arg(long)]
    pub end: f64,
    #[arg(long, env = "TINYDREAMERS_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,
}

fn media_service(config: &ClientConfig, bucket: &str) -> Result<MediaUrlService> {
    let platform = config.platform_client(http_client()?)?;
    Ok(MediaUrlService::new(
        Arc::new(PlatformStorage::new(platform)),
        bucket,
    ))
}

pub async fn sign(config: &ClientConfig, command: SignCommand) -> Result<()> {
    let service = media_service(config, &command.bucket)?;
    match service
        .get_signed_url(&command.reference, command.expires_in)
        .await
    {
        Some(url) => {
            println!("{url}");
            Ok(())
        }
        None => bail!("could not sign {}", command.reference),
    }
}

pub async fn moments(config: &ClientConfig, command: MomentsCommand) -> Result<()> {
    let contents = tokio::fs::read_to_string(&command.file)
        .await
        .with_context(|| format!("failed to read {}", command.file.display()))?;
    let moments: Vec<MomentRecord> =
        serde_json::from_str(&contents).context("expected a JSON array of moments")?;

    let service = media_service(config, VIDEO_MOMENTS_BUCKET)?;
    let signed = service
        .process_moments_with_signed_urls(moments, command.expires_in)
        .await;
    print_json(&signed)
}

pub async fn trim(command: TrimCommand) -> Result<()> {
    let trimmer = FfmpegTrimmer::new(command.ffmpeg);
    let output = trimmer
        .trim(&command.input, command.start, command.end)
        .await?;
    println!("{}", output.display());
    Ok(())
}
