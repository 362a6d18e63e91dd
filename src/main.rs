//! # Magazine Archive
//!
//! Crawls weekly magazine editions and stores them as a browsable offline
//! Markdown archive: one directory per edition with a cover, a section index
//! and one Markdown file per article, images alongside.
//!
//! ## Usage
//!
//! ```sh
//! magazine_archive economist               # latest edition
//! magazine_archive economist -d 2020-07-25 # one edition
//! magazine_archive economist -y 2019       # every edition of a year
//! ```
//!
//! ## Architecture
//!
//! 1. **Resolution**: turn the request into one or more dated editions
//! 2. **Extraction**: read edition and article pages into structured data
//! 3. **Output**: reset each edition directory, then write cover, section
//!    index, articles and images
//!
//! Only resolution failures end the run with a non-zero status. Everything
//! after that is logged and skipped per item.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod crawler;
mod errors;
mod extract;
mod http;
mod images;
mod layout;
mod models;
mod outputs;
mod report;
mod utils;

use cli::Cli;
use config::CrawlConfig;
use crawler::Crawler;
use extract::economist::EconomistExtractor;
use http::HttpClient;
use serde_json::Value;
use utils::{ensure_writable_dir, normalize_date};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    info!(magazine = %args.magazine, date = ?args.date, year = ?args.year, "Starting magazine_archive");

    if !args.is_supported_magazine() {
        warn!(magazine = %args.magazine, "Unsupported magazine; only \"economist\" is available");
        eprintln!("magazine {:?} is not supported", args.magazine);
        return Ok(());
    }

    // ---- Config ----
    let mut config = CrawlConfig::load(args.config.as_deref().map(Path::new)).await?;
    if let Some(dir) = &args.output_dir {
        config = config.with_output_dir(dir);
    }
    if let Some(secs) = args.interval_secs() {
        config = config.with_pacing_secs(secs);
    }
    info!(
        output_dir = %config.output_dir.display(),
        pacing = ?config.pacing,
        base_url = %config.base_url,
        "Effective configuration"
    );
    ensure_writable_dir(&config.output_dir).await?;

    let http = HttpClient::new(&config)?;
    let extractor = EconomistExtractor::new(http.clone(), config.base_url.clone());
    let crawler = Crawler::new(extractor, http, config);

    // ---- Crawl ----
    let report: Value = if let Some(raw) = &args.date {
        let date = normalize_date(raw).inspect_err(|e| error!(error = %e, "Invalid --date"))?;
        let edition = crawler.crawl_by_day(&date).await;
        info!(
            date = %edition.date,
            completed = edition.is_completed(),
            articles = edition.written_articles().len(),
            skipped = edition.skips().count(),
            "Day crawl finished"
        );
        edition.to_json()
    } else if let Some(year) = &args.year {
        let year_report = crawler
            .crawl_by_year(year)
            .await
            .inspect_err(|e| error!(%year, error = %e, "Year crawl could not start"))?;
        info!(
            year = %year_report.year,
            editions = year_report.editions.len(),
            completed = year_report.editions.iter().filter(|e| e.is_completed()).count(),
            "Year crawl finished"
        );
        year_report.to_json()
    } else {
        let edition = crawler.crawl_latest().await?;
        info!(
            date = %edition.date,
            completed = edition.is_completed(),
            articles = edition.written_articles().len(),
            skipped = edition.skips().count(),
            "Latest crawl finished"
        );
        edition.to_json()
    };

    if let Some(path) = &args.report {
        match tokio::fs::write(path, serde_json::to_string_pretty(&report)?).await {
            Ok(()) => info!(%path, "Wrote crawl report"),
            Err(e) => error!(%path, error = %e, "Failed to write crawl report"),
        }
    }

    let elapsed = start_time.elapsed();
    info!(elapsed_secs = elapsed.as_secs_f64(), "magazine_archive finished");
    Ok(())
}
