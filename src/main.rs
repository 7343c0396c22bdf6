use anyhow::Result;
use clap::Parser;
use tinydreamers::application::{ServerConfig, serve};
use tinydreamers::presentation::cli::{Cli, ClientConfig, Commands, ServeCommand, covers, media};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Before clap reads TINYDREAMERS_* variables
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(cmd) => run_server(&cli.client, cmd).await,
        Commands::Cover(cmd) => covers::find_cover(&cli.client, cmd).await,
        Commands::ProcessCover(cmd) => covers::process_cover(&cli.client, cmd).await,
        Commands::Sign(cmd) => media::sign(&cli.client, cmd).await,
        Commands::Moments(cmd) => media::moments(&cli.client, cmd).await,
        Commands::Trim(cmd) => media::trim(cmd).await,
    }
}

async fn run_server(client: &ClientConfig, command: ServeCommand) -> Result<()> {
    let config = ServerConfig {
        bind_address: command.bind_address,
        google_api_key: command.google_api_key.unwrap_or_default(),
        google_engine_id: command.google_search_engine_id.unwrap_or_default(),
        storage_url: client.storage_url()?.to_string(),
        storage_key: client.storage_key()?.to_string(),
    };

    serve(config).await
}

/// Logs go to stderr; stdout carries command output.
#[allow(clippy::expect_used)] // init() panics if a global subscriber is already set
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("RUST_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
