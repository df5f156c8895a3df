use crate::types::{DigestError, FetchConfig, Result};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

/// Retrieves raw feed documents. One attempt per URL; the next scheduled run is the retry.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub async fn fetch_feed(&self, url: &str) -> Result<String> {
        let start_time = Instant::now();
        let parsed = Url::parse(url)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(DigestError::Fetch {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        debug!("Fetching feed: {}", url);

        let response = self.client.get(parsed).send().await.map_err(|e| DigestError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DigestError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}: {}", status.as_u16(), status.canonical_reason().unwrap_or("Unknown")),
            });
        }

        let limit_bytes = self.config.max_feed_size_mb * 1024 * 1024;
        if let Some(content_length) = response.content_length() {
            if content_length as usize > limit_bytes {
                return Err(self.too_large(url, content_length as usize));
            }
        }

        let content = response.text().await.map_err(|e| DigestError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        // Chunked responses carry no content length
        if content.len() > limit_bytes {
            return Err(self.too_large(url, content.len()));
        }

        info!(
            "Fetched feed: {} ({} bytes in {} ms)",
            url,
            content.len(),
            start_time.elapsed().as_millis()
        );
        Ok(content)
    }

    fn too_large(&self, url: &str, size_bytes: usize) -> DigestError {
        DigestError::Fetch {
            url: url.to_string(),
            reason: format!(
                "feed size {} bytes exceeds limit of {}MB",
                size_bytes, self.config.max_feed_size_mb
            ),
        }
    }
}
