//! Per-edition crawl reports.
//!
//! The pipeline never aborts an edition for a single failed article or
//! image. Instead every step records an [`ItemResult`], and the resulting
//! [`EditionReport`] says exactly what was written and what was skipped and
//! why.

use crate::errors::CrawlError;
use serde_json::{Value, json};
use std::fmt;

/// Pipeline stage an item result belongs to. Also used as the `stage` field
/// on log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Plan,
    YearIndex,
    ResetDir,
    FetchCover,
    SectionIndex,
    PrepDirs,
    FetchArticle,
    FetchImages,
    WriteFile,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Plan => "plan",
            Stage::YearIndex => "year_index",
            Stage::ResetDir => "reset_dir",
            Stage::FetchCover => "fetch_cover",
            Stage::SectionIndex => "section_index",
            Stage::PrepDirs => "prep_dirs",
            Stage::FetchArticle => "fetch_article",
            Stage::FetchImages => "fetch_images",
            Stage::WriteFile => "write_file",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Done,
    Skipped(CrawlError),
}

/// Result of one unit of work: a directory, an image, an article fetch, a file.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemResult {
    pub stage: Stage,
    /// URL or path the step worked on.
    pub target: String,
    pub outcome: Outcome,
}

impl ItemResult {
    pub fn done(stage: Stage, target: impl Into<String>) -> Self {
        Self {
            stage,
            target: target.into(),
            outcome: Outcome::Done,
        }
    }

    pub fn skipped(stage: Stage, target: impl Into<String>, reason: CrawlError) -> Self {
        Self {
            stage,
            target: target.into(),
            outcome: Outcome::Skipped(reason),
        }
    }

    pub fn is_done(&self) -> bool {
        self.outcome == Outcome::Done
    }

    pub fn reason(&self) -> Option<&CrawlError> {
        match &self.outcome {
            Outcome::Done => None,
            Outcome::Skipped(reason) => Some(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditionStatus {
    /// Reached DONE; individual items may still have been skipped.
    Completed,
    /// Nothing was written for this edition.
    Skipped(CrawlError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditionReport {
    pub date: String,
    pub title: String,
    pub status: EditionStatus,
    pub items: Vec<ItemResult>,
}

impl EditionReport {
    pub fn new(date: &str) -> Self {
        Self {
            date: date.to_string(),
            title: String::new(),
            status: EditionStatus::Completed,
            items: Vec::new(),
        }
    }

    pub fn record(&mut self, item: ItemResult) {
        self.items.push(item);
    }

    pub fn is_completed(&self) -> bool {
        self.status == EditionStatus::Completed
    }

    /// Paths of the article files that were written.
    pub fn written_articles(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| i.stage == Stage::WriteFile && i.is_done())
            .map(|i| i.target.as_str())
            .collect()
    }

    pub fn skips(&self) -> impl Iterator<Item = &ItemResult> {
        self.items.iter().filter(|i| !i.is_done())
    }

    pub fn skips_at(&self, stage: Stage) -> Vec<&ItemResult> {
        self.skips().filter(|i| i.stage == stage).collect()
    }

    pub fn to_json(&self) -> Value {
        let status = match &self.status {
            EditionStatus::Completed => json!("completed"),
            EditionStatus::Skipped(reason) => json!({ "skipped": reason.to_string() }),
        };
        let skipped: Vec<Value> = self
            .skips()
            .map(|i| {
                json!({
                    "stage": i.stage.as_str(),
                    "target": i.target,
                    "reason": i.reason().map(|r| r.to_string()),
                })
            })
            .collect();
        json!({
            "date": self.date,
            "title": self.title,
            "status": status,
            "articles_written": self.written_articles(),
            "skipped": skipped,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearReport {
    pub year: String,
    /// Writing the year index page.
    pub index: ItemResult,
    pub editions: Vec<EditionReport>,
}

impl YearReport {
    pub fn to_json(&self) -> Value {
        json!({
            "year": self.year,
            "index": {
                "target": self.index.target,
                "reason": self.index.reason().map(|r| r.to_string()),
            },
            "editions": self.editions.iter().map(EditionReport::to_json).collect::<Vec<_>>(),
        })
    }
}
