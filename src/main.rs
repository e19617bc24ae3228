use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use tagcheck::check::check_all;
use tagcheck::config::Settings;
use tagcheck::image::{DockerImageLister, local_images};
use tagcheck::logging::{self, LogFormat};
use tagcheck::version::fetcher::TagFetcher;
use tagcheck::version::registries::TagsEndpointRegistry;

#[derive(Parser)]
#[command(name = "tagcheck")]
#[command(version, about = "Check local container images for newer tags")]
struct Cli {
    /// YAML config file (defaults to ./config.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of images checked at the same time
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(&cli.log_level, cli.log_format, cli.log_file.as_deref())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Error loading config")?;
    if let Some(n) = cli.max_concurrency.filter(|n| *n > 0) {
        settings.max_concurrency = n;
    }

    let registry = TagsEndpointRegistry::new(settings.auth_scheme, settings.auth_token.as_deref())
        .context("Error creating HTTP client")?;
    let fetcher = Arc::new(TagFetcher::from_settings(Arc::new(registry), &settings));

    let images = local_images(&DockerImageLister::default())
        .await
        .context("Error getting local images")?;

    let summary = check_all(fetcher, images, settings.max_concurrency).await;
    for update in &summary.updates {
        println!("{}", update);
    }
    info!("Done");

    Ok(())
}
