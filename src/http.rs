//! HTTP access for the crawler.
//!
//! [`Fetch`] is the seam between the pipeline and the network: the page
//! extractor reads HTML through it and the image fetcher reads bytes through
//! it. [`HttpClient`] is the reqwest-backed implementation.
//!
//! Every request is attempted exactly once. There is no retry layer.

use crate::config::CrawlConfig;
use crate::errors::CrawlError;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, LOCATION};
use reqwest::{Client, ClientBuilder, redirect};
use std::time::Instant;
use tracing::{debug, instrument, warn};
use url::Url;

pub trait Fetch {
    /// GET a page body as text. Non-2xx statuses are errors.
    async fn text(&self, url: &str) -> Result<String, CrawlError>;

    /// GET a resource as raw bytes. Non-2xx statuses are errors.
    async fn bytes(&self, url: &str) -> Result<Vec<u8>, CrawlError>;

    /// Issue one request without following redirects and return the
    /// absolute target of the `Location` header.
    async fn redirect_location(&self, url: &str) -> Result<String, CrawlError>;
}

impl<T: Fetch> Fetch for &T {
    async fn text(&self, url: &str) -> Result<String, CrawlError> {
        (**self).text(url).await
    }

    async fn bytes(&self, url: &str) -> Result<Vec<u8>, CrawlError> {
        (**self).bytes(url).await
    }

    async fn redirect_location(&self, url: &str) -> Result<String, CrawlError> {
        (**self).redirect_location(url).await
    }
}

/// reqwest client pair: one that follows redirects for normal fetches and
/// one that never does, used to discover where a redirect points.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    no_redirect: Client,
}

impl HttpClient {
    pub fn new(config: &CrawlConfig) -> Result<Self, CrawlError> {
        let builder = || {
            let mut headers = HeaderMap::new();
            headers.insert(
                ACCEPT,
                HeaderValue::from_static("text/html,application/xhtml+xml,image/*;q=0.9,*/*;q=0.8"),
            );
            ClientBuilder::new()
                .timeout(config.timeout)
                .user_agent(config.user_agent.as_str())
                .default_headers(headers)
        };

        let client = builder()
            .redirect(redirect::Policy::limited(10))
            .build()
            .map_err(CrawlError::from_reqwest_error)?;
        let no_redirect = builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(CrawlError::from_reqwest_error)?;

        Ok(Self {
            client,
            no_redirect,
        })
    }

    async fn get_ok(&self, url: &str) -> Result<reqwest::Response, CrawlError> {
        let parsed = Url::parse(url)?;
        let t0 = Instant::now();
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(CrawlError::from_reqwest_error)?;

        let status = response.status();
        debug!(%url, %status, elapsed_ms = t0.elapsed().as_millis() as u64, "GET");
        if !status.is_success() {
            return Err(CrawlError::Http {
                status,
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

impl Fetch for HttpClient {
    #[instrument(level = "debug", skip(self))]
    async fn text(&self, url: &str) -> Result<String, CrawlError> {
        self.get_ok(url)
            .await?
            .text()
            .await
            .map_err(CrawlError::from_reqwest_error)
    }

    #[instrument(level = "debug", skip(self))]
    async fn bytes(&self, url: &str) -> Result<Vec<u8>, CrawlError> {
        let body = self
            .get_ok(url)
            .await?
            .bytes()
            .await
            .map_err(CrawlError::from_reqwest_error)?;
        Ok(body.to_vec())
    }

    #[instrument(level = "debug", skip(self))]
    async fn redirect_location(&self, url: &str) -> Result<String, CrawlError> {
        let request_url = Url::parse(url)?;
        let response = self
            .no_redirect
            .get(request_url.clone())
            .send()
            .await
            .map_err(CrawlError::from_reqwest_error)?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match location {
            Some(location) if status.is_redirection() => {
                let target = request_url.join(location)?;
                debug!(%status, %target, "Redirect target");
                Ok(target.to_string())
            }
            _ => {
                warn!(%url, %status, "Expected a redirect with a Location header");
                Err(CrawlError::MissingRedirect(url.to_string()))
            }
        }
    }
}
