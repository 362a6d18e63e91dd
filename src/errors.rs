//! Error taxonomy for the crawl pipeline.
//!
//! Every failure the pipeline can observe is a [`CrawlError`]. Errors are
//! `Clone + PartialEq` so the orchestrator can keep them in an
//! [`EditionReport`](crate::report::EditionReport) as skip reasons and tests
//! can match on the exact cause.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrawlError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("http error {status} for {url}")]
    Http {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("unexpected page at {url}: {detail}")]
    UnexpectedPage { url: String, detail: String },

    #[error("no redirect location returned by {0}")]
    MissingRedirect(String),

    #[error("unrecognized date: {0:?}")]
    InvalidDate(String),

    #[error("unrecognized year: {0:?}")]
    InvalidYear(String),

    #[error("no file name can be derived from {0:?}")]
    EmptySlug(String),

    #[error("io error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("config error: {0}")]
    Config(String),
}

impl CrawlError {
    /// Classify a transport error. Status errors keep their code so callers
    /// can tell a 404 edition apart from a dead connection.
    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        if err.is_timeout() {
            Self::Timeout(url)
        } else if let Some(status) = err.status() {
            Self::Http { status, url }
        } else {
            Self::Request(err.to_string())
        }
    }

    pub fn io(path: impl AsRef<Path>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }
}
