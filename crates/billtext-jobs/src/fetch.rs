//! HTTP download of attachment bodies.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use billtext_core::{DocumentFetcher, Error, Result};

/// Fetches attachments with a plain, unauthenticated GET.
///
/// Redirects follow reqwest's default policy. Any non-success status is a
/// fetch failure so an error page never reaches a converter.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher. `None` leaves requests without a timeout.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("GET {} returned {}", url, status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("Reading body of {} failed: {}", url, e)))?;

        debug!(
            subsystem = "jobs",
            component = "fetch",
            url,
            bytes = body.len(),
            "Attachment downloaded"
        );
        Ok(body.to_vec())
    }
}
