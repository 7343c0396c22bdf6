pub mod covers;
pub mod media;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use covers::{CoverCommand, ProcessCoverCommand};
use media::{MomentsCommand, SignCommand, TrimCommand};

use crate::infrastructure::client::FunctionsClient;
use crate::infrastructure::storage::PlatformClient;

#[derive(Debug, Parser)]
#[command(author, version, about = "Media and cover services for TinyDreamers", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub client: ClientConfig,

    #[command(subcommand)]
    pub command: Commands,
}

/// How to reach the hosted platform.
#[derive(Debug, Clone, Args)]
pub struct ClientConfig {
    /// Base URL of the storage/database platform
    #[arg(long, global = true, env = "TINYDREAMERS_STORAGE_URL")]
    pub storage_url: Option<String>,

    /// Service or anon key for the platform
    #[arg(long, global = true, env = "TINYDREAMERS_STORAGE_KEY", hide_env_values = true)]
    pub storage_key: Option<String>,

    /// Base URL of the serverless functions (defaults to <storage-url>/functions/v1)
    #[arg(long, global = true, env = "TINYDREAMERS_FUNCTIONS_URL")]
    pub functions_url: Option<String>,

    /// Bearer token for calls to the serverless functions (defaults to the storage key)
    #[arg(long, global = true, env = "TINYDREAMERS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl ClientConfig {
    pub fn storage_url(&self) -> Result<&str> {
        self.storage_url
            .as_deref()
            .context("--storage-url (or TINYDREAMERS_STORAGE_URL) is required")
    }

    pub fn storage_key(&self) -> Result<&str> {
        self.storage_key
            .as_deref()
            .context("--storage-key (or TINYDREAMERS_STORAGE_KEY) is required")
    }

    pub fn functions_url(&self) -> Result<String> {
        if let Some(url) = &self.functions_url {
            return Ok(url.trim_end_matches('/').to_string());
        }
        let storage_url = self
            .storage_url()
            .context("either --functions-url or --storage-url is required")?;
        Ok(format!("{}/functions/v1", storage_url.trim_end_matches('/')))
    }

    pub fn function_token(&self) -> Option<String> {
        self.token.clone().or_else(|| self.storage_key.clone())
    }

    pub fn platform_client(&self, http: reqwest::Client) -> Result<PlatformClient> {
        PlatformClient::with_client(self.storage_url()?, self.storage_key()?, http)
    }

    pub fn functions_client(&self) -> Result<FunctionsClient> {
        FunctionsClient::from_base_url(&self.functions_url()?, self.function_token())
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the cover-search and process-cover functions
    Serve(ServeCommand),

    /// Find the best cover for a book
    Cover(CoverCommand),

    /// Convert and store a cover through the process-cover function
    #[command(name = "process-cover")]
    ProcessCover(ProcessCoverCommand),

    /// Issue a signed URL for a stored media reference
    Sign(SignCommand),

    /// Attach signed URLs to a JSON array of moments
    Moments(MomentsCommand),

    /// Trim a moment video to a time range
    Trim(TrimCommand),
}

#[derive(Debug, Args)]
pub struct ServeCommand {
    #[arg(long, env = "TINYDREAMERS_BIND_ADDRESS", default_value = "127.0.0.1:8000")]
    pub bind_address: SocketAddr,

    #[arg(long, env = "TINYDREAMERS_GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    #[arg(long, env = "TINYDREAMERS_GOOGLE_SEARCH_ENGINE_ID")]
    pub google_search_engine_id: Option<String>,
}

pub(crate) fn print_json<T>(value: &T) -> Result<()>
where
    T: serde::Serialize,
{
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("tinydreamers-cli/1.0")
        .build()
        .context("failed to configure HTTP client")
}
