//! Command-line interface definitions for the magazine archiver.
//!
//! One positional argument names the magazine; at most one of `--date` and
//! `--year` picks what to crawl. With neither, the latest edition is crawled.

use clap::Parser;

/// Command-line arguments for the magazine archiver.
///
/// # Examples
///
/// ```sh
/// # Latest edition into the current directory
/// magazine_archive economist
///
/// # One edition, pausing two seconds between articles
/// magazine_archive economist -d 2020-07-25 -i
///
/// # A whole year into ./archive, with a JSON report
/// magazine_archive economist -y 2019 -o ./archive --report report.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Magazine to crawl (only "economist" is supported)
    pub magazine: String,

    /// Crawl the edition published on this date (YYYY-MM-DD)
    #[arg(short, long, conflicts_with = "year")]
    pub date: Option<String>,

    /// Crawl every edition published in this year
    #[arg(short, long)]
    pub year: Option<String>,

    /// Pause between article fetches; seconds, 2 when given without a value
    #[arg(short, long, num_args = 0..=1, value_name = "SECS")]
    pub interval: Option<Option<u64>>,

    /// Directory the archive is written into
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Write a JSON report of what was written and skipped to this path
    #[arg(long)]
    pub report: Option<String>,
}

impl Cli {
    /// Pacing override from `-i`: `None` when the flag is absent.
    pub fn interval_secs(&self) -> Option<Option<u64>> {
        self.interval
    }

    pub fn is_supported_magazine(&self) -> bool {
        self.magazine.eq_ignore_ascii_case("economist")
    }
}
