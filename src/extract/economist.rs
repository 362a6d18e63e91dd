//! Economist page extractor.
//!
//! Scrapes the weekly edition pages, article pages and the yearly archive
//! with CSS selectors. Parsing is split from fetching: the `parse_*`
//! functions take HTML text and are tested against fixtures.
//!
//! # URL Pattern
//!
//! - current edition: `/weeklyedition` (redirects to the dated edition)
//! - dated edition: `/weeklyedition/2020-07-25`
//! - year archive: `/weeklyedition/archive?year=2019`
//! - articles: site-relative links such as `/leaders/2020/07/25/some-title`

use super::PageExtractor;
use crate::errors::CrawlError;
use crate::http::Fetch;
use crate::models::{ArchiveEntry, Article, BodyBlock, Edition, EditionPage, Section};
use crate::utils::{normalize_date, truncate_for_log, url_slug};
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::fmt::Write;
use tracing::{debug, info, instrument, warn};
use url::Url;

const LATEST_EDITION_PATH: &str = "/weeklyedition";
const ARCHIVE_PATH: &str = "/weeklyedition/archive";

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static EDITION_TITLE: Lazy<Selector> = Lazy::new(|| selector(".weekly-edition-header__headline"));
static EDITION_COVER: Lazy<Selector> = Lazy::new(|| selector(".weekly-edition-header__image img"));
static EDITION_SECTION: Lazy<Selector> = Lazy::new(|| selector(".layout-weekly-edition-section"));
static SECTION_HEADLINE: Lazy<Selector> = Lazy::new(|| selector(".ds-section-headline"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static IMG: Lazy<Selector> = Lazy::new(|| selector("img"));

static ARTICLE_HEADER: Lazy<Selector> = Lazy::new(|| selector(".layout-article-header"));
static HEADLINE: Lazy<Selector> = Lazy::new(|| selector(".article__headline"));
static SUB_HEADLINE: Lazy<Selector> = Lazy::new(|| selector(".article__subheadline"));
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector(".article__description"));
static ARTICLE_BODY: Lazy<Selector> = Lazy::new(|| selector(".layout-article-body"));
static ARTICLE_META: Lazy<Selector> = Lazy::new(|| selector(".layout-article-meta"));
static BODY_BLOCKS: Lazy<Selector> = Lazy::new(|| selector(".article__body-text, img"));

static TEASER: Lazy<Selector> = Lazy::new(|| selector(".edition-teaser"));
static TEASER_HEADLINE: Lazy<Selector> = Lazy::new(|| selector(".edition-teaser__headline"));
static TEASER_DATE: Lazy<Selector> = Lazy::new(|| selector(".edition-teaser__subheadline"));
static TEASER_LINK: Lazy<Selector> = Lazy::new(|| selector(".headline-link"));

/// [`PageExtractor`] for economist.com.
#[derive(Debug, Clone)]
pub struct EconomistExtractor<F> {
    fetch: F,
    base_url: Url,
}

impl<F: Fetch> EconomistExtractor<F> {
    pub fn new(fetch: F, base_url: Url) -> Self {
        Self { fetch, base_url }
    }

    fn archive_url(&self, year: &str) -> Result<Url, CrawlError> {
        let mut url = self.base_url.join(ARCHIVE_PATH)?;
        url.query_pairs_mut().append_pair("year", year);
        Ok(url)
    }
}

impl<F: Fetch> PageExtractor for EconomistExtractor<F> {
    #[instrument(level = "info", skip(self))]
    async fn fetch_edition_page(&self, url: &str) -> Result<EditionPage, CrawlError> {
        let html = self.fetch.text(url).await?;
        let page = parse_edition_page(&html, &self.base_url);
        if page.title.is_empty() && page.cover_image_url.is_empty() && page.sections.is_empty() {
            warn!(preview = %truncate_for_log(&html, 200), "No edition header or sections found");
            return Err(CrawlError::UnexpectedPage {
                url: url.to_string(),
                detail: "no edition header or sections".to_string(),
            });
        }
        info!(
            title = %page.title,
            sections = page.sections.len(),
            links = page.sections.iter().map(|s| s.article_links.len()).sum::<usize>(),
            "Parsed edition page"
        );
        Ok(page)
    }

    #[instrument(level = "info", skip(self))]
    async fn fetch_article_page(&self, url: &str) -> Result<Article, CrawlError> {
        let html = self.fetch.text(url).await?;
        let article = parse_article_page(&html, url, &self.base_url).ok_or_else(|| {
            CrawlError::UnexpectedPage {
                url: url.to_string(),
                detail: "no article header or body".to_string(),
            }
        })?;
        debug!(
            headline = %article.headline,
            blocks = article.body.len(),
            images = article.body_image_urls().len(),
            "Parsed article"
        );
        Ok(article)
    }

    #[instrument(level = "info", skip(self))]
    async fn fetch_year_archive(&self, year: &str) -> Result<Vec<ArchiveEntry>, CrawlError> {
        let url = self.archive_url(year)?;
        let html = self.fetch.text(url.as_str()).await?;
        let entries = parse_year_archive(&html, &self.base_url);
        info!(count = entries.len(), %url, "Parsed year archive");
        Ok(entries)
    }

    #[instrument(level = "info", skip(self))]
    async fn resolve_latest_edition(&self) -> Result<Edition, CrawlError> {
        let url = self.base_url.join(LATEST_EDITION_PATH)?;
        let location = self.fetch.redirect_location(url.as_str()).await?;
        edition_from_location(&location)
    }
}

/// Turn the latest-edition redirect target into an edition suffix and date.
pub fn edition_from_location(location: &str) -> Result<Edition, CrawlError> {
    let path = match Url::parse(location) {
        Ok(url) => url.path().to_string(),
        Err(_) => location.to_string(),
    };
    let date = normalize_date(url_slug(&path))?;
    Ok(Edition {
        remote_url: path,
        title: String::new(),
        date,
        cover_image_url: String::new(),
    })
}

pub fn parse_edition_page(html: &str, base: &Url) -> EditionPage {
    let document = Html::parse_document(html);

    let title = document
        .select(&EDITION_TITLE)
        .next()
        .map(text_of)
        .unwrap_or_default();
    let cover_image_url = document
        .select(&EDITION_COVER)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| absolutize(base, src))
        .unwrap_or_default();

    let sections = document
        .select(&EDITION_SECTION)
        .map(|section| Section {
            title: child_text(section, &SECTION_HEADLINE)
                .trim_matches('\'')
                .to_string(),
            article_links: section
                .select(&LINK)
                .filter_map(|a| a.value().attr("href"))
                .map(|href| href.trim().to_string())
                .filter(|href| !href.is_empty())
                .collect(),
        })
        .collect();

    EditionPage {
        title,
        cover_image_url,
        sections,
    }
}

/// `None` when the page has neither an article header nor a body.
pub fn parse_article_page(html: &str, url: &str, base: &Url) -> Option<Article> {
    let document = Html::parse_document(html);
    let header = document.select(&ARTICLE_HEADER).next();
    let body = document.select(&ARTICLE_BODY).next();
    if header.is_none() && body.is_none() {
        return None;
    }

    let mut article = Article {
        source_url: url.to_string(),
        ..Default::default()
    };

    if let Some(header) = header {
        article.headline = child_text(header, &HEADLINE);
        article.sub_headline = child_text(header, &SUB_HEADLINE);
        article.description = child_text(header, &DESCRIPTION);
        article.lead_image_url = header
            .select(&IMG)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| absolutize(base, src))
            .unwrap_or_default();
    }

    if let Some(body) = body {
        article.meta = child_text(body, &ARTICLE_META);
        for block in body.select(&BODY_BLOCKS) {
            if block.value().name() == "img" {
                let src = block.value().attr("src").unwrap_or_default();
                if !src.trim().is_empty() {
                    article.body.push(BodyBlock::Image(absolutize(base, src)));
                }
            } else {
                article.body.push(BodyBlock::Paragraph(paragraph_markdown(block, base)));
            }
        }
    }

    Some(article)
}

pub fn parse_year_archive(html: &str, base: &Url) -> Vec<ArchiveEntry> {
    let document = Html::parse_document(html);
    document
        .select(&TEASER)
        .filter_map(|teaser| {
            let url = teaser
                .select(&TEASER_LINK)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::trim)
                .filter(|href| !href.is_empty())?
                .to_string();
            Some(ArchiveEntry {
                url,
                title: child_text(teaser, &TEASER_HEADLINE),
                raw_date: child_text(teaser, &TEASER_DATE),
                cover_image_url: teaser
                    .select(&IMG)
                    .next()
                    .and_then(|img| img.value().attr("src"))
                    .map(|src| absolutize(base, src))
                    .unwrap_or_default(),
            })
        })
        .collect()
}

/// Paragraph text with every `<a>` rewritten to `[text](absolute-url)`.
fn paragraph_markdown(element: ElementRef, base: &Url) -> String {
    let mut out = String::new();
    push_inline(element, base, &mut out);
    collapse_whitespace(&out)
}

fn push_inline(element: ElementRef, base: &Url, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(el) = ElementRef::wrap(child) {
            if el.value().name() != "a" {
                push_inline(el, base, out);
                continue;
            }
            let text = text_of(el);
            match el.value().attr("href").and_then(|h| base.join(h.trim()).ok()) {
                Some(href) => write!(out, "[{text}]({href})").unwrap(),
                None => out.push_str(&text),
            }
        }
    }
}

/// Join an image `src` onto the site root, keeping any width hint.
fn absolutize(base: &Url, src: &str) -> String {
    let src = src.trim();
    let mut parts = src.splitn(2, char::is_whitespace);
    let link = parts.next().unwrap_or_default();
    if link.is_empty() || link.starts_with("data:") {
        return link.to_string();
    }
    let Ok(absolute) = base.join(link) else {
        return src.to_string();
    };
    match parts.next().map(str::trim).filter(|hint| !hint.is_empty()) {
        Some(hint) => format!("{absolute} {hint}"),
        None => absolute.to_string(),
    }
}

fn text_of(element: ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn child_text(element: ElementRef, selector: &Selector) -> String {
    element.select(selector).next().map(text_of).unwrap_or_default()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().join(" ")
}
