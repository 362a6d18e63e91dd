//! Page extraction.
//!
//! The crawler only ever sees structured data. [`PageExtractor`] is the
//! contract between it and whatever knows a site's markup; the [`economist`]
//! submodule implements it with CSS selectors over the Economist's pages.
//!
//! # Contract
//!
//! | Method | Returns |
//! |--------|---------|
//! | `fetch_edition_page` | edition title, cover URL, sections with raw article links |
//! | `fetch_article_page` | one article, body links already rewritten to Markdown |
//! | `fetch_year_archive` | the teasers listed for a year, in page order |
//! | `resolve_latest_edition` | suffix and date of the current edition |
//!
//! Any call may fail with a [`CrawlError`]; the crawler decides whether that
//! skips an item or ends the invocation.

pub mod economist;

use crate::errors::CrawlError;
use crate::models::{ArchiveEntry, Article, Edition, EditionPage};

pub trait PageExtractor {
    async fn fetch_edition_page(&self, url: &str) -> Result<EditionPage, CrawlError>;

    async fn fetch_article_page(&self, url: &str) -> Result<Article, CrawlError>;

    async fn fetch_year_archive(&self, year: &str) -> Result<Vec<ArchiveEntry>, CrawlError>;

    /// Follow exactly one redirect from the current-edition endpoint. The
    /// returned edition carries only `remote_url` and `date`.
    async fn resolve_latest_edition(&self) -> Result<Edition, CrawlError>;

    /// Site-relative location of the edition published on `date`.
    fn edition_suffix(&self, date: &str) -> String {
        format!("/weeklyedition/{date}")
    }
}

impl<T: PageExtractor> PageExtractor for &T {
    async fn fetch_edition_page(&self, url: &str) -> Result<EditionPage, CrawlError> {
        (**self).fetch_edition_page(url).await
    }

    async fn fetch_article_page(&self, url: &str) -> Result<Article, CrawlError> {
        (**self).fetch_article_page(url).await
    }

    async fn fetch_year_archive(&self, year: &str) -> Result<Vec<ArchiveEntry>, CrawlError> {
        (**self).fetch_year_archive(year).await
    }

    async fn resolve_latest_edition(&self) -> Result<Edition, CrawlError> {
        (**self).resolve_latest_edition().await
    }

    fn edition_suffix(&self, date: &str) -> String {
        (**self).edition_suffix(date)
    }
}
