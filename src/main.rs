use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use solescrape::{AppConfig, ExtractionSession};

#[derive(Parser, Debug)]
#[command(name = "solescrape", version, about = "Scrape the shoe catalog into images and a CSV export")]
struct Cli {
    /// Path to the settings document
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("solescrape=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();
    info!("Starting solescrape...");

    // The loader has already logged the specific failure.
    let Some(config) = AppConfig::load(&cli.config) else {
        std::process::exit(1);
    };

    let session = match ExtractionSession::new(config) {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "failed to start browser session");
            return Err(e.into());
        }
    };

    let outcome = session.run().await;
    session.close();

    let summary = outcome?;
    info!(
        links = summary.links,
        products = summary.products,
        images_saved = summary.images_saved,
        images_failed = summary.images_failed,
        csv = %summary.csv_path.display(),
        "Shutting down..."
    );

    Ok(())
}
