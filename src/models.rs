//! Data models for editions, sections and articles.
//!
//! This module defines the structures that flow between the page extractor
//! and the rest of the pipeline:
//! - [`Edition`]: one dated issue, resolved before anything is fetched
//! - [`EditionPage`] / [`Section`]: what an edition's front page lists
//! - [`Article`] / [`BodyBlock`]: one article's header and body
//! - [`ArchiveEntry`]: one teaser from a year's archive listing

use serde::{Deserialize, Serialize};

/// A single dated issue of the magazine.
///
/// Identity is the normalized date. `remote_url` is the site-relative suffix
/// (`/weeklyedition/2020-07-25`) the edition page lives under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edition {
    pub remote_url: String,
    pub title: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub cover_image_url: String,
}

/// Structured contents of an edition's front page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionPage {
    pub title: String,
    pub cover_image_url: String,
    pub sections: Vec<Section>,
}

/// A named group of articles within an edition, e.g. "Leaders".
///
/// Links come back from the extractor in page order and may repeat; the
/// orchestrator deduplicates them before anything else sees the section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub article_links: Vec<String>,
}

/// One block of an article body, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyBlock {
    /// Paragraph text with hyperlinks already rewritten to Markdown.
    Paragraph(String),
    /// Remote image URL, possibly carrying a width hint.
    Image(String),
}

/// One article as extracted from its page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub lead_image_url: String,
    pub headline: String,
    pub sub_headline: String,
    pub description: String,
    /// Byline / dateline.
    pub meta: String,
    pub body: Vec<BodyBlock>,
    /// Canonical URL the article was fetched from.
    pub source_url: String,
}

impl Article {
    /// Body image URLs in the order their placeholders appear in the body.
    ///
    /// Derived from [`Article::body`] so the two can never disagree.
    pub fn body_image_urls(&self) -> Vec<&str> {
        self.body
            .iter()
            .filter_map(|block| match block {
                BodyBlock::Image(url) => Some(url.as_str()),
                BodyBlock::Paragraph(_) => None,
            })
            .collect()
    }

    /// Lead image followed by body images: everything the article needs on disk.
    pub fn image_urls(&self) -> Vec<&str> {
        let lead = Some(self.lead_image_url.as_str()).filter(|u| !u.is_empty());
        lead.into_iter().chain(self.body_image_urls()).collect()
    }
}

/// One teaser on a year's archive listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Site-relative edition URL, e.g. `/weeklyedition/2019-12-21`.
    pub url: String,
    pub title: String,
    /// Date text as printed on the teaser; unreliable, used only as fallback.
    pub raw_date: String,
    pub cover_image_url: String,
}
