//! Edition crawl orchestration.
//!
//! [`Crawler`] turns a request (latest, one day, one year) into edition
//! crawls and runs each one through a fixed, sequential pipeline:
//!
//! 1. **Plan**: resolve the edition suffix and date, fetch the edition page
//! 2. **Reset**: delete and recreate `<date>/`
//! 3. **Cover**: download `<date>/cover.jpg`
//! 4. **Section index**: write `<date>/readme.md`
//! 5. **Directories**: create each section's markdown and image directories
//! 6. **Articles**: for each article, fetch, render, download images, write
//!
//! Nothing runs concurrently and nothing is retried. A failed article or
//! image is recorded in the [`EditionReport`] and the crawl moves on.

use crate::config::CrawlConfig;
use crate::errors::CrawlError;
use crate::extract::PageExtractor;
use crate::http::Fetch;
use crate::images::ImageFetcher;
use crate::layout::{COVER_FILE_NAME, EditionLayout};
use crate::models::{ArchiveEntry, Edition, Section};
use crate::outputs::indexes::{write_section_index, write_year_index};
use crate::outputs::markdown::article_to_markdown;
use crate::report::{EditionReport, EditionStatus, ItemResult, Stage, YearReport};
use crate::utils::{dedup, normalize_date, normalize_year, url_slug};
use itertools::Itertools;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

pub struct Crawler<X, F> {
    extractor: X,
    images: ImageFetcher<F>,
    config: CrawlConfig,
}

impl<X: PageExtractor, F: Fetch> Crawler<X, F> {
    pub fn new(extractor: X, fetch: F, config: CrawlConfig) -> Self {
        Self {
            extractor,
            images: ImageFetcher::new(fetch),
            config,
        }
    }

    /// Crawl whatever edition the site currently redirects to.
    ///
    /// Fails only if the redirect cannot be resolved.
    #[instrument(level = "info", skip(self))]
    pub async fn crawl_latest(&self) -> Result<EditionReport, CrawlError> {
        let edition = self
            .extractor
            .resolve_latest_edition()
            .await
            .inspect_err(|e| error!(stage = %Stage::Plan, error = %e, "Could not resolve the latest edition"))?;
        info!(stage = %Stage::Plan, suffix = %edition.remote_url, date = %edition.date, "Latest edition resolved");
        Ok(self.crawl_edition(&edition).await)
    }

    /// Crawl the edition for an already-normalized `YYYY-MM-DD` date.
    #[instrument(level = "info", skip(self))]
    pub async fn crawl_by_day(&self, date: &str) -> EditionReport {
        let edition = Edition {
            remote_url: self.extractor.edition_suffix(date),
            title: String::new(),
            date: date.to_string(),
            cover_image_url: String::new(),
        };
        self.crawl_edition(&edition).await
    }

    /// Crawl every edition listed in a year's archive.
    ///
    /// The year index is rewritten from the fresh listing before any edition
    /// is crawled, so it is current even if some editions fail later. Each
    /// edition is fetched from the URL the archive lists, and the archive's
    /// title and cover stand in when the edition page lacks them.
    #[instrument(level = "info", skip(self))]
    pub async fn crawl_by_year(&self, year: &str) -> Result<YearReport, CrawlError> {
        let year = normalize_year(year)?;
        let entries = self
            .extractor
            .fetch_year_archive(&year)
            .await
            .inspect_err(|e| error!(stage = %Stage::Plan, %year, error = %e, "Could not read the year archive"))?;
        let editions = editions_from_archive(entries);
        info!(stage = %Stage::Plan, %year, count = editions.len(), "Editions listed for year");

        let index = match write_year_index(
            &self.config.output_dir,
            &self.config.site_name,
            &year,
            &editions,
        )
        .await
        {
            Ok(path) => ItemResult::done(Stage::YearIndex, path.display().to_string()),
            Err(e) => {
                error!(stage = %Stage::YearIndex, error = %e, "Failed to write year index");
                ItemResult::skipped(Stage::YearIndex, year.as_str(), e)
            }
        };

        let mut report = YearReport {
            year,
            index,
            editions: Vec::with_capacity(editions.len()),
        };
        for edition in &editions {
            report.editions.push(self.crawl_edition(edition).await);
        }
        Ok(report)
    }

    #[instrument(level = "info", skip_all, fields(date = %planned.date, suffix = %planned.remote_url))]
    async fn crawl_edition(&self, planned: &Edition) -> EditionReport {
        let mut report = EditionReport::new(&planned.date);

        let page = match self.fetch_edition_page(planned).await {
            Ok(page) => page,
            Err(e) => {
                error!(stage = %Stage::Plan, error = %e, "Edition page unavailable; skipping edition");
                report.status = EditionStatus::Skipped(e);
                return report;
            }
        };

        let sections: Vec<Section> = page
            .sections
            .into_iter()
            .map(|section| Section {
                title: section.title,
                article_links: dedup(section.article_links),
            })
            .collect();
        report.title = [page.title.trim(), planned.title.trim(), planned.date.as_str()]
            .into_iter()
            .find(|t| !t.is_empty())
            .unwrap_or_default()
            .to_string();

        let layout = EditionLayout::new(&self.config.output_dir, &planned.date);

        // reset
        if let Err(e) = reset_dir(layout.root()).await {
            error!(stage = %Stage::ResetDir, error = %e, "Could not recreate edition directory; skipping edition");
            report.status = EditionStatus::Skipped(e);
            return report;
        }
        info!(stage = %Stage::ResetDir, dir = %layout.root().display(), "Edition directory reset");
        report.record(ItemResult::done(Stage::ResetDir, layout.root().display().to_string()));

        // cover, falling back to the archive teaser image
        let cover_url = [page.cover_image_url.trim(), planned.cover_image_url.trim()]
            .into_iter()
            .find(|u| !u.is_empty())
            .unwrap_or_default();
        info!(stage = %Stage::FetchCover, url = %cover_url, path = %layout.cover_path().display(), "Downloading cover");
        let cover = self
            .images
            .fetch_all(
                Stage::FetchCover,
                layout.root(),
                Some(COVER_FILE_NAME),
                &[cover_url],
            )
            .await;
        report.items.extend(cover);

        // section index
        match write_section_index(&layout, &report.title, &sections).await {
            Ok(path) => report.record(ItemResult::done(Stage::SectionIndex, path.display().to_string())),
            Err(e) => {
                error!(stage = %Stage::SectionIndex, error = %e, "Failed to write section index");
                report.record(ItemResult::skipped(
                    Stage::SectionIndex,
                    layout.index_path().display().to_string(),
                    e,
                ));
            }
        }

        // directories
        for section in &sections {
            let dir = layout.image_dir(&section.title);
            match fs::create_dir_all(&dir).await {
                Ok(()) => report.record(ItemResult::done(Stage::PrepDirs, dir.display().to_string())),
                Err(e) => {
                    let err = CrawlError::io(&dir, e);
                    error!(stage = %Stage::PrepDirs, section = %section.title, error = %err, "Failed to create section directories");
                    report.record(ItemResult::skipped(Stage::PrepDirs, dir.display().to_string(), err));
                }
            }
        }

        // articles
        for section in &sections {
            for link in &section.article_links {
                self.crawl_article(&layout, section, link, &mut report).await;
            }
        }

        let written = report.written_articles().len();
        let skipped = report.skips().count();
        info!(stage = "done", written, skipped, "Edition crawl finished");
        report
    }

    async fn fetch_edition_page(
        &self,
        planned: &Edition,
    ) -> Result<crate::models::EditionPage, CrawlError> {
        let url = self.config.site_url(&planned.remote_url)?;
        info!(stage = %Stage::Plan, %url, "Fetching edition page");
        self.extractor.fetch_edition_page(url.as_str()).await
    }

    #[instrument(level = "info", skip_all, fields(section = %section.title, %link))]
    async fn crawl_article(
        &self,
        layout: &EditionLayout,
        section: &Section,
        link: &str,
        report: &mut EditionReport,
    ) {
        let slug = url_slug(link);
        if slug.is_empty() {
            warn!(stage = %Stage::FetchArticle, "Article link has no slug; skipping");
            report.record(ItemResult::skipped(
                Stage::FetchArticle,
                link,
                CrawlError::EmptySlug(link.to_string()),
            ));
            return;
        }

        let url = match self.config.site_url(link) {
            Ok(url) => url,
            Err(e) => {
                warn!(stage = %Stage::FetchArticle, error = %e, "Bad article link; skipping");
                report.record(ItemResult::skipped(Stage::FetchArticle, link, e));
                return;
            }
        };

        if let Some(delay) = self.config.pacing {
            debug!(?delay, "Pacing before article fetch");
            sleep(delay).await;
        }

        let article = match self.extractor.fetch_article_page(url.as_str()).await {
            Ok(article) => article,
            Err(e) => {
                warn!(stage = %Stage::FetchArticle, %url, error = %e, "Article fetch failed; skipping");
                report.record(ItemResult::skipped(Stage::FetchArticle, url.as_str(), e));
                return;
            }
        };
        info!(stage = %Stage::FetchArticle, %url, headline = %article.headline, "Fetched article");
        report.record(ItemResult::done(Stage::FetchArticle, url.as_str()));

        let markdown = article_to_markdown(&article);

        let images = self
            .images
            .fetch_all(
                Stage::FetchImages,
                &layout.image_dir(&section.title),
                None,
                &article.image_urls(),
            )
            .await;
        report.items.extend(images);

        let path = layout.article_path(&section.title, slug);
        match fs::write(&path, markdown).await {
            Ok(()) => {
                info!(stage = %Stage::WriteFile, path = %path.display(), "Wrote article");
                report.record(ItemResult::done(Stage::WriteFile, path.display().to_string()));
            }
            Err(e) => {
                let err = CrawlError::io(&path, e);
                warn!(stage = %Stage::WriteFile, error = %err, "Could not write article; skipping");
                report.record(ItemResult::skipped(Stage::WriteFile, path.display().to_string(), err));
            }
        }
    }
}

/// Archive entries to editions, in listing order.
///
/// The date comes from the edition URL's last segment, falling back to the
/// teaser's printed date. Entries with neither are dropped, as are repeats
/// of a date already listed.
pub fn editions_from_archive(entries: Vec<ArchiveEntry>) -> Vec<Edition> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let date = normalize_date(url_slug(&entry.url))
                .or_else(|_| normalize_date(&entry.raw_date));
            match date {
                Ok(date) => Some(Edition {
                    remote_url: entry.url,
                    title: entry.title,
                    date,
                    cover_image_url: entry.cover_image_url,
                }),
                Err(e) => {
                    warn!(stage = %Stage::Plan, url = %entry.url, raw_date = %entry.raw_date, error = %e, "Archive entry has no usable date; dropping");
                    None
                }
            }
        })
        .unique_by(|edition| edition.date.clone())
        .collect()
}

/// Remove `dir` and everything under it, then create it empty.
async fn reset_dir(dir: &Path) -> Result<(), CrawlError> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(CrawlError::io(dir, e)),
    }
    fs::create_dir_all(dir)
        .await
        .map_err(|e| CrawlError::io(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::tests::FakeFetch;
    use crate::models::{Article, BodyBlock, EditionPage};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    const BASE: &str = "https://www.economist.com";

    /// Extractor serving canned pages keyed by absolute URL.
    #[derive(Default)]
    struct FakeExtractor {
        editions: HashMap<String, EditionPage>,
        articles: HashMap<String, Article>,
        archive: Option<Vec<ArchiveEntry>>,
        latest: Option<Edition>,
        /// When set, each edition fetch snapshots this file's contents.
        watch_file: Option<PathBuf>,
        edition_calls: Mutex<Vec<(String, Option<String>)>>,
        article_calls: Mutex<Vec<String>>,
    }

    impl FakeExtractor {
        fn edition(mut self, date: &str, page: EditionPage) -> Self {
            self.editions
                .insert(format!("{BASE}/weeklyedition/{date}"), page);
            self
        }

        fn edition_at(mut self, suffix: &str, page: EditionPage) -> Self {
            self.editions.insert(format!("{BASE}{suffix}"), page);
            self
        }

        fn article(mut self, link: &str, article: Article) -> Self {
            self.articles.insert(format!("{BASE}{link}"), article);
            self
        }

        fn edition_calls(&self) -> Vec<(String, Option<String>)> {
            self.edition_calls.lock().unwrap().clone()
        }

        fn article_calls(&self) -> Vec<String> {
            self.article_calls.lock().unwrap().clone()
        }
    }

    impl PageExtractor for FakeExtractor {
        async fn fetch_edition_page(&self, url: &str) -> Result<EditionPage, CrawlError> {
            let snapshot = self
                .watch_file
                .as_ref()
                .and_then(|p| std::fs::read_to_string(p).ok());
            self.edition_calls
                .lock()
                .unwrap()
                .push((url.to_string(), snapshot));
            self.editions.get(url).cloned().ok_or_else(|| CrawlError::Http {
                status: reqwest::StatusCode::NOT_FOUND,
                url: url.to_string(),
            })
        }

        async fn fetch_article_page(&self, url: &str) -> Result<Article, CrawlError> {
            self.article_calls.lock().unwrap().push(url.to_string());
            self.articles.get(url).cloned().ok_or_else(|| CrawlError::UnexpectedPage {
                url: url.to_string(),
                detail: "no article".to_string(),
            })
        }

        async fn fetch_year_archive(&self, year: &str) -> Result<Vec<ArchiveEntry>, CrawlError> {
            self.archive.clone().ok_or_else(|| CrawlError::Http {
                status: reqwest::StatusCode::NOT_FOUND,
                url: format!("{BASE}/weeklyedition/archive?year={year}"),
            })
        }

        async fn resolve_latest_edition(&self) -> Result<Edition, CrawlError> {
            self.latest
                .clone()
                .ok_or_else(|| CrawlError::MissingRedirect(format!("{BASE}/weeklyedition")))
        }
    }

    fn config(dir: &Path) -> CrawlConfig {
        CrawlConfig::default().with_output_dir(dir)
    }

    fn page(title: &str, cover: &str, sections: Vec<(&str, Vec<&str>)>) -> EditionPage {
        EditionPage {
            title: title.to_string(),
            cover_image_url: cover.to_string(),
            sections: sections
                .into_iter()
                .map(|(t, links)| Section {
                    title: t.to_string(),
                    article_links: links.into_iter().map(String::from).collect(),
                })
                .collect(),
        }
    }

    fn article(link: &str, headline: &str) -> Article {
        Article {
            headline: headline.to_string(),
            body: vec![BodyBlock::Paragraph(format!("Body of {headline}."))],
            source_url: format!("{BASE}{link}"),
            ..Default::default()
        }
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_day_crawl_deduplicates_links() {
        let tmp = tempfile::tempdir().unwrap();
        let link = "/leaders/2020/07/25/the-big-one";
        let extractor = FakeExtractor::default()
            .edition(
                "2020-07-25",
                page("The world this week", "https://cdn/cover-0725.jpg", vec![("Leaders", vec![link, link])]),
            )
            .article(link, article(link, "The big one"));
        let fetch = FakeFetch::default().with("https://cdn/cover-0725.jpg", b"cover");
        let crawler = Crawler::new(&extractor, &fetch, config(tmp.path()));

        let report = crawler.crawl_by_day("2020-07-25").await;

        assert!(report.is_completed());
        let root = tmp.path().join("2020-07-25");
        assert_eq!(files_in(&root.join("Leaders")), vec!["images", "the-big-one.md"]);
        assert_eq!(report.written_articles().len(), 1);
        assert_eq!(extractor.article_calls().len(), 1);

        let index = std::fs::read_to_string(root.join("readme.md")).unwrap();
        assert_eq!(index.matches("#### [").count(), 1);
        assert!(index.contains("#### [The big one](./Leaders/the-big-one.md)"));
        assert_eq!(std::fs::read(root.join("cover.jpg")).unwrap(), b"cover");

        let md = std::fs::read_to_string(root.join("Leaders/the-big-one.md")).unwrap();
        assert!(md.starts_with("# The big one\n"));
    }

    #[tokio::test]
    async fn test_article_images_land_beside_placeholders() {
        let tmp = tempfile::tempdir().unwrap();
        let link = "/briefing/2020/07/25/pictures";
        let mut a = article(link, "Pictures");
        a.lead_image_url = "https://cdn/img/cover.jpg 1024".into();
        a.body = vec![
            BodyBlock::Paragraph("Intro.".into()),
            BodyBlock::Image("https://cdn/img/20200725_BRC1.png 2048".into()),
            BodyBlock::Paragraph("Middle.".into()),
            BodyBlock::Image("https://cdn/img/20200725_BRC2.png".into()),
        ];
        let extractor = FakeExtractor::default()
            .edition("2020-07-25", page("T", "", vec![("Briefing", vec![link])]))
            .article(link, a);
        let fetch = FakeFetch::default()
            .with("https://cdn/img/cover.jpg", b"lead")
            .with("https://cdn/img/20200725_BRC1.png", b"one")
            .with("https://cdn/img/20200725_BRC2.png", b"two");
        let crawler = Crawler::new(&extractor, &fetch, config(tmp.path()));

        let report = crawler.crawl_by_day("2020-07-25").await;

        let section = tmp.path().join("2020-07-25/Briefing");
        let md = std::fs::read_to_string(section.join("pictures.md")).unwrap();
        assert_eq!(md.lines().next(), Some("![](./images/cover.jpg)"));
        let refs: Vec<&str> = md.lines().skip(1).filter(|l| l.starts_with("![](")).collect();
        assert_eq!(
            refs,
            vec!["![](./images/20200725_BRC1.png)", "![](./images/20200725_BRC2.png)"]
        );
        assert_eq!(
            files_in(&section.join("images")),
            vec!["20200725_BRC1.png", "20200725_BRC2.png", "cover.jpg"]
        );
        // the edition had no cover URL
        assert_eq!(report.skips_at(Stage::FetchCover).len(), 1);
        assert!(report.skips_at(Stage::FetchImages).is_empty());
    }

    #[tokio::test]
    async fn test_edition_without_sections() {
        let tmp = tempfile::tempdir().unwrap();
        let extractor = FakeExtractor::default()
            .edition("2020-07-25", page("Quiet week", "https://cdn/c.jpg", vec![]));
        let fetch = FakeFetch::default().with("https://cdn/c.jpg", b"c");
        let crawler = Crawler::new(&extractor, &fetch, config(tmp.path()));

        let report = crawler.crawl_by_day("2020-07-25").await;

        assert!(report.is_completed());
        assert_eq!(report.skips().count(), 0);
        let root = tmp.path().join("2020-07-25");
        assert_eq!(files_in(&root), vec!["cover.jpg", "readme.md"]);
        assert_eq!(
            std::fs::read_to_string(root.join("readme.md")).unwrap(),
            "## Quiet week\n\n![](./cover.jpg)\n"
        );
    }

    #[tokio::test]
    async fn test_failures_are_recorded_and_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let good = "/finance/2020/07/25/good";
        let extractor = FakeExtractor::default()
            .edition(
                "2020-07-25",
                page(
                    "T",
                    "https://cdn/c.jpg",
                    vec![("Finance", vec!["/finance/2020/07/25/gone", "/finance/", good])],
                ),
            )
            .article(good, {
                let mut a = article(good, "Good");
                a.body.push(BodyBlock::Image("https://cdn/img/missing.png".into()));
                a
            });
        let fetch = FakeFetch::default().with("https://cdn/c.jpg", b"c");
        let crawler = Crawler::new(&extractor, &fetch, config(tmp.path()));

        let report = crawler.crawl_by_day("2020-07-25").await;

        assert!(report.is_completed());
        let article_skips = report.skips_at(Stage::FetchArticle);
        assert_eq!(article_skips.len(), 2);
        assert!(matches!(
            article_skips[0].reason(),
            Some(CrawlError::UnexpectedPage { .. })
        ));
        assert_eq!(
            article_skips[1].reason(),
            Some(&CrawlError::EmptySlug("/finance/".into()))
        );
        let image_skips = report.skips_at(Stage::FetchImages);
        assert_eq!(image_skips.len(), 1);
        assert_eq!(image_skips[0].target, "https://cdn/img/missing.png");

        // the article is still written, placeholder included
        let md = std::fs::read_to_string(tmp.path().join("2020-07-25/Finance/good.md")).unwrap();
        assert!(md.contains("![](./images/missing.png)"));
        assert_eq!(report.written_articles().len(), 1);
        // the slugless link never reached the extractor
        assert_eq!(extractor.article_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_discards_stale_files() {
        let tmp = tempfile::tempdir().unwrap();
        let stale = tmp.path().join("2020-07-25/Old section/old.md");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "stale").unwrap();

        let extractor = FakeExtractor::default()
            .edition("2020-07-25", page("T", "https://cdn/c.jpg", vec![]));
        let fetch = FakeFetch::default().with("https://cdn/c.jpg", b"c");
        let crawler = Crawler::new(&extractor, &fetch, config(tmp.path()));

        let report = crawler.crawl_by_day("2020-07-25").await;

        assert!(!stale.exists());
        assert!(!tmp.path().join("2020-07-25/Old section").exists());
        assert_eq!(report.items[0].stage, Stage::ResetDir);
    }

    #[tokio::test]
    async fn test_missing_edition_page_leaves_existing_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let kept = tmp.path().join("2020-07-25/readme.md");
        std::fs::create_dir_all(kept.parent().unwrap()).unwrap();
        std::fs::write(&kept, "previous run").unwrap();

        let extractor = FakeExtractor::default();
        let fetch = FakeFetch::default();
        let crawler = Crawler::new(&extractor, &fetch, config(tmp.path()));

        let report = crawler.crawl_by_day("2020-07-25").await;

        assert!(matches!(
            report.status,
            EditionStatus::Skipped(CrawlError::Http { .. })
        ));
        assert!(report.items.is_empty());
        assert_eq!(std::fs::read_to_string(&kept).unwrap(), "previous run");
    }

    #[tokio::test]
    async fn test_pacing_delays_each_article() {
        let tmp = tempfile::tempdir().unwrap();
        let (a, b) = ("/x/2020/07/25/a", "/x/2020/07/25/b");
        let extractor = FakeExtractor::default()
            .edition("2020-07-25", page("T", "", vec![("X", vec![a, b])]))
            .article(a, article(a, "A"))
            .article(b, article(b, "B"));
        let fetch = FakeFetch::default();
        let mut cfg = config(tmp.path());
        cfg.pacing = Some(Duration::from_millis(40));
        let crawler = Crawler::new(&extractor, &fetch, cfg);

        let t0 = Instant::now();
        let report = crawler.crawl_by_day("2020-07-25").await;

        assert!(t0.elapsed() >= Duration::from_millis(80));
        assert_eq!(report.written_articles().len(), 2);
    }

    #[tokio::test]
    async fn test_latest_uses_redirect_target() {
        let tmp = tempfile::tempdir().unwrap();
        let mut extractor = FakeExtractor::default()
            .edition("2020-08-01", page("Latest", "https://cdn/c.jpg", vec![]));
        extractor.latest = Some(Edition {
            remote_url: "/weeklyedition/2020-08-01".into(),
            title: String::new(),
            date: "2020-08-01".into(),
            cover_image_url: String::new(),
        });
        let fetch = FakeFetch::default().with("https://cdn/c.jpg", b"c");
        let crawler = Crawler::new(&extractor, &fetch, config(tmp.path()));

        let report = crawler.crawl_latest().await.unwrap();

        assert_eq!(report.date, "2020-08-01");
        assert_eq!(report.title, "Latest");
        assert!(tmp.path().join("2020-08-01/readme.md").exists());
    }

    #[tokio::test]
    async fn test_latest_resolution_failure_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let extractor = FakeExtractor::default();
        let fetch = FakeFetch::default();
        let crawler = Crawler::new(&extractor, &fetch, config(tmp.path()));

        let err = crawler.crawl_latest().await.unwrap_err();
        assert!(matches!(err, CrawlError::MissingRedirect(_)));
        assert!(extractor.edition_calls().is_empty());
    }

    #[tokio::test]
    async fn test_year_crawl() {
        let tmp = tempfile::tempdir().unwrap();
        let dates = ["2019-12-21", "2019-12-14", "2019-12-07"];
        let mut extractor = FakeExtractor::default();
        for date in dates {
            extractor = extractor.edition(date, page(date, "", vec![]));
            let stale = tmp.path().join(date).join("stale.md");
            std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
            std::fs::write(stale, "stale").unwrap();
        }
        let mut archive: Vec<ArchiveEntry> = dates
            .iter()
            .map(|d| ArchiveEntry {
                url: format!("/weeklyedition/{d}"),
                title: format!("Issue {d}"),
                ..Default::default()
            })
            .collect();
        archive.push(ArchiveEntry {
            url: "/weeklyedition/special".into(),
            raw_date: "not a date".into(),
            ..Default::default()
        });
        extractor.archive = Some(archive);
        extractor.watch_file = Some(tmp.path().join("readme.md"));
        let fetch = FakeFetch::default();
        let crawler = Crawler::new(&extractor, &fetch, config(tmp.path()));

        let report = crawler.crawl_by_year("2019").await.unwrap();

        assert!(report.index.is_done());
        assert_eq!(report.editions.len(), 3);
        let calls = extractor.edition_calls();
        assert_eq!(calls.len(), 3);
        for (i, date) in dates.iter().enumerate() {
            assert_eq!(calls[i].0, format!("{BASE}/weeklyedition/{date}"));
            // the year index was already complete before the first day crawl
            let snapshot = calls[i].1.as_deref().unwrap();
            assert!(snapshot.starts_with("# Economist 2019"));
            assert!(dates.iter().all(|d| snapshot.contains(&format!("./{d}/cover.jpg"))));
            assert_eq!(report.editions[i].items[0].stage, Stage::ResetDir);
            assert!(!tmp.path().join(date).join("stale.md").exists());
        }
        assert_eq!(calls[0].1, calls[2].1);
    }

    #[tokio::test]
    async fn test_year_crawl_fetches_listed_url_with_archive_fallbacks() {
        let tmp = tempfile::tempdir().unwrap();
        let mut extractor =
            FakeExtractor::default().edition_at("/weeklyedition/special-issue", page("", "", vec![]));
        extractor.archive = Some(vec![ArchiveEntry {
            url: "/weeklyedition/special-issue".into(),
            title: "The year ahead".into(),
            raw_date: "Dec 14th 2019".into(),
            cover_image_url: "https://cdn/archive-cover.jpg".into(),
        }]);
        let fetch = FakeFetch::default().with("https://cdn/archive-cover.jpg", b"teaser");
        let crawler = Crawler::new(&extractor, &fetch, config(tmp.path()));

        let report = crawler.crawl_by_year("2019").await.unwrap();

        let calls = extractor.edition_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, format!("{BASE}/weeklyedition/special-issue"));
        let edition = &report.editions[0];
        assert!(edition.is_completed());
        assert_eq!(edition.date, "2019-12-14");
        assert_eq!(edition.title, "The year ahead");

        let root = tmp.path().join("2019-12-14");
        assert_eq!(std::fs::read(root.join("cover.jpg")).unwrap(), b"teaser");
        assert!(
            std::fs::read_to_string(root.join("readme.md"))
                .unwrap()
                .starts_with("## The year ahead\n")
        );
    }

    #[tokio::test]
    async fn test_section_titles_cannot_escape_edition_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        let hostile = elsewhere.path().join("Leaders").display().to_string();
        let link = "/leaders/2020/07/25/escaped";
        let extractor = FakeExtractor::default()
            .edition(
                "2020-07-25",
                page("T", "", vec![(hostile.as_str(), vec![link]), ("..", vec![link])]),
            )
            .article(link, article(link, "Escaped"));
        let fetch = FakeFetch::default();
        let crawler = Crawler::new(&extractor, &fetch, config(tmp.path()));

        let report = crawler.crawl_by_day("2020-07-25").await;

        assert!(!elsewhere.path().join("Leaders").exists());
        assert!(!tmp.path().join("escaped.md").exists());
        let root = tmp.path().join("2020-07-25");
        assert_eq!(report.written_articles().len(), 2);
        for written in report.written_articles() {
            assert!(Path::new(written).starts_with(&root), "{written}");
        }
        assert!(root.join("Untitled/escaped.md").exists());
        let index = std::fs::read_to_string(root.join("readme.md")).unwrap();
        assert!(index.contains("(./Untitled/escaped.md)"));
    }

    #[tokio::test]
    async fn test_year_crawl_rejects_bad_year_and_missing_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let extractor = FakeExtractor::default();
        let fetch = FakeFetch::default();
        let crawler = Crawler::new(&extractor, &fetch, config(tmp.path()));

        assert_eq!(
            crawler.crawl_by_year("19").await.unwrap_err(),
            CrawlError::InvalidYear("19".into())
        );
        assert!(matches!(
            crawler.crawl_by_year("2019").await,
            Err(CrawlError::Http { .. })
        ));
        assert!(!tmp.path().join("readme.md").exists());
    }

    #[test]
    fn test_editions_from_archive() {
        let entries = vec![
            ArchiveEntry {
                url: "/weeklyedition/2019-12-21".into(),
                ..Default::default()
            },
            ArchiveEntry {
                url: "/weeklyedition/special-issue".into(),
                raw_date: "Dec 14th 2019".into(),
                ..Default::default()
            },
            ArchiveEntry {
                url: "/weeklyedition/2019-12-21".into(),
                ..Default::default()
            },
            ArchiveEntry {
                url: "/weeklyedition/whatever".into(),
                ..Default::default()
            },
        ];
        let dates: Vec<String> = editions_from_archive(entries)
            .into_iter()
            .map(|e| e.date)
            .collect();
        assert_eq!(dates, vec!["2019-12-21", "2019-12-14"]);
    }
}
