use calend_scraper::cli::{ArchiveArgs, Cli, Commands, ExportArgs};
use calend_scraper::errors::ScraperError;
use calend_scraper::export::run_export;
use calend_scraper::page_archive::archive_year;
use calend_scraper::scraper_client::{SavedPageSource, ScraperClient};
use chrono::Datelike;
use clap::Parser;
use log::info;
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<(), ScraperError> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let start = Instant::now();
    match cli.command {
        Commands::Export(args) => export(args).await?,
        Commands::Archive(args) => archive(args).await?,
    }
    info!("Time Elapsed {:?}", start.elapsed());

    Ok(())
}

async fn export(args: ExportArgs) -> Result<(), ScraperError> {
    let options = args.options();

    let report = match &args.pages_dir {
        Some(dir) => run_export(&mut SavedPageSource::new(dir), &options).await?,
        None => {
            let mut client = ScraperClient::new_with_config(args.fetch.client_config())?;
            let result = run_export(&mut client, &options).await;
            client.print_stats();
            result?
        }
    };

    info!(
        "Exported {} holidays ({} category links) to {}",
        report.holidays,
        report.links,
        report.script_path.display()
    );
    Ok(())
}

async fn archive(args: ArchiveArgs) -> Result<(), ScraperError> {
    let year = args.year.unwrap_or_else(|| chrono::Utc::now().year());
    let mut client = ScraperClient::new_with_config(args.fetch.client_config())?;

    let summary = archive_year(&mut client, &args.base_url, year, &args.output_dir).await?;
    client.print_stats();

    info!(
        "Archived {}: {} saved, {} already present, {} failed",
        year, summary.saved, summary.skipped, summary.failed
    );
    Ok(())
}
