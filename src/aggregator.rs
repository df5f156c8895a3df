use crate::{Article, FeedParser, Fetcher, Result};
use tracing::{error, info, warn};

/// Articles gathered from one pass over the configured feeds.
#[derive(Debug, Default)]
pub struct FeedCollection {
    pub articles: Vec<Article>,
    pub feeds_fetched: usize,
    pub feeds_failed: usize,
}

/// Fetches and parses every configured feed in order.
/// A failing feed contributes nothing and does not stop the others.
pub struct FeedAggregator {
    fetcher: Fetcher,
    parser: FeedParser,
}

impl FeedAggregator {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            parser: FeedParser::new(),
        }
    }

    pub async fn collect(&mut self, feed_urls: &[String]) -> FeedCollection {
        let mut collection = FeedCollection::default();
        self.parser.clear_deduplication_cache();

        info!("Fetching {} feeds", feed_urls.len());

        for url in feed_urls {
            match self.fetch_single_feed(url).await {
                Ok(mut articles) => {
                    collection.feeds_fetched += 1;
                    collection.articles.append(&mut articles);
                }
                Err(e) => {
                    collection.feeds_failed += 1;
                    error!("Failed to fetch feed {}: {}", url, e);
                }
            }
        }

        if collection.feeds_failed > 0 {
            warn!(
                "{}/{} feeds failed this run",
                collection.feeds_failed,
                feed_urls.len()
            );
        }
        info!(
            "Collected {} articles from {}/{} feeds",
            collection.articles.len(),
            collection.feeds_fetched,
            feed_urls.len()
        );
        collection
    }

    async fn fetch_single_feed(&mut self, url: &str) -> Result<Vec<Article>> {
        let content = self.fetcher.fetch_feed(url).await?;
        self.parser.parse_feed(&content, url)
    }
}
