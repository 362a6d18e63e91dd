//! Image downloads.
//!
//! Images are fetched one at a time and written into the target directory.
//! A failed image is logged and skipped; it never stops the batch. The
//! filename is either the explicit override (the edition cover is always
//! `cover.jpg`) or the URL's final path segment with the width hint removed,
//! which is the same name the Markdown placeholders reference.

use crate::errors::CrawlError;
use crate::http::Fetch;
use crate::report::{ItemResult, Stage};
use crate::utils::{strip_width_hint, url_slug};
use futures::stream::{self, StreamExt};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct ImageFetcher<F> {
    fetch: F,
}

impl<F: Fetch> ImageFetcher<F> {
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }

    /// Download every URL into `dir`, in order. An empty list is a no-op.
    #[instrument(level = "info", skip_all, fields(%stage, dir = %dir.display(), count = urls.len()))]
    pub async fn fetch_all(
        &self,
        stage: Stage,
        dir: &Path,
        file_name: Option<&str>,
        urls: &[&str],
    ) -> Vec<ItemResult> {
        let results: Vec<ItemResult> = stream::iter(urls.iter().copied())
            .then(move |url| self.fetch_one(stage, dir, file_name, url))
            .collect()
            .await;

        let saved = results.iter().filter(|r| r.is_done()).count();
        if !results.is_empty() {
            info!(saved, failed = results.len() - saved, "Fetched images");
        }
        results
    }

    async fn fetch_one(
        &self,
        stage: Stage,
        dir: &Path,
        file_name: Option<&str>,
        url: &str,
    ) -> ItemResult {
        let remote = strip_width_hint(url);
        let name = file_name.unwrap_or_else(|| url_slug(url));
        if remote.is_empty() || name.is_empty() {
            debug!(%stage, %url, "No file name for image; skipping");
            return ItemResult::skipped(stage, url, CrawlError::EmptySlug(url.to_string()));
        }

        let bytes = match self.fetch.bytes(remote).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(%stage, url = %remote, error = %e, "Image download failed; skipping");
                return ItemResult::skipped(stage, url, e);
            }
        };

        let path = dir.join(name);
        if let Err(e) = fs::write(&path, &bytes).await {
            let err = CrawlError::io(&path, e);
            warn!(%stage, url = %remote, error = %err, "Image write failed; skipping");
            return ItemResult::skipped(stage, url, err);
        }

        debug!(%stage, path = %path.display(), bytes = bytes.len(), "Saved image");
        ItemResult::done(stage, url)
    }
}
