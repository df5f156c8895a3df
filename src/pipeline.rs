use crate::aggregator::FeedAggregator;
use crate::config::DigestConfig;
use crate::filter::{KeywordFilter, RelevanceFilter};
use crate::formatter::format_notification;
use crate::notifier::{Notifier, SlackNotifier};
use crate::store::ProcessedStore;
use crate::summarizer::{OpenAiSummarizer, SummaryModel};
use crate::types::{Article, Result, RunReport};
use crate::Fetcher;
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// One pass of fetch → filter → dedup → summarize → format → notify → commit.
pub struct DigestPipeline {
    feeds: Vec<String>,
    max_batch_articles: usize,
    aggregator: FeedAggregator,
    filter: Box<dyn RelevanceFilter>,
    summarizer: Box<dyn SummaryModel>,
    notifier: Box<dyn Notifier>,
}

impl DigestPipeline {
    pub fn new(
        config: &DigestConfig,
        aggregator: FeedAggregator,
        filter: Box<dyn RelevanceFilter>,
        summarizer: Box<dyn SummaryModel>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            feeds: config.feeds.clone(),
            max_batch_articles: config.max_batch_articles.max(1),
            aggregator,
            filter,
            summarizer,
            notifier,
        }
    }

    /// Builds the default components. Credentials are checked here, before
    /// anything touches the network.
    pub fn from_config(config: &DigestConfig) -> Result<Self> {
        let summarizer = OpenAiSummarizer::new(&config.openai)?;
        let notifier = SlackNotifier::new(config.slack_webhook_url.as_deref(), config.fetch.timeout_seconds)?;
        let fetcher = Fetcher::new(config.fetch.clone())?;
        let filter = KeywordFilter::new(config.keywords.iter().cloned());

        info!(
            "Pipeline ready: {} feeds, filter {}, summarizer {}, notifier {}",
            config.feeds.len(),
            filter.filter_name(),
            summarizer.model_name(),
            notifier.notifier_name()
        );

        Ok(Self::new(
            config,
            FeedAggregator::new(fetcher),
            Box::new(filter),
            Box::new(summarizer),
            Box::new(notifier),
        ))
    }

    /// Runs once. Feed and batch failures are logged and counted; only
    /// configuration and persistence failures are returned as errors.
    pub async fn run(&mut self, store: &mut ProcessedStore) -> Result<RunReport> {
        let span = info_span!("run", run_id = %Uuid::new_v4());
        self.run_inner(store).instrument(span).await
    }

    async fn run_inner(&mut self, store: &mut ProcessedStore) -> Result<RunReport> {
        let mut report = RunReport::default();

        let collection = self.aggregator.collect(&self.feeds).await;
        report.feeds_fetched = collection.feeds_fetched;
        report.feeds_failed = collection.feeds_failed;
        report.articles_seen = collection.articles.len();

        let relevant: Vec<Article> = collection
            .articles
            .into_iter()
            .filter(|article| self.filter.is_relevant(article))
            .collect();
        report.articles_relevant = relevant.len();
        info!("{} of {} articles are relevant", relevant.len(), report.articles_seen);

        let fresh = select_fresh(relevant, store);
        report.articles_fresh = fresh.len();

        if fresh.is_empty() {
            info!("Nothing new to report");
            return Ok(report);
        }

        let batches = into_batches(fresh, self.max_batch_articles);
        let total = batches.len();
        info!("Processing {} new articles in {} batches", report.articles_fresh, total);

        for (i, batch) in batches.iter().enumerate() {
            match self.process_batch(batch, store).await {
                Ok(committed) => {
                    report.batches_notified += 1;
                    report.articles_committed += committed;
                    info!("Batch {}/{} notified, {} ids committed", i + 1, total, committed);
                }
                Err(e) if e.is_fatal() => {
                    error!("Batch {}/{} aborted the run: {}", i + 1, total, e);
                    return Err(e);
                }
                Err(e) => {
                    report.batches_failed += 1;
                    warn!(
                        "Batch {}/{} skipped, {} articles left for the next run: {}",
                        i + 1,
                        total,
                        batch.len(),
                        e
                    );
                }
            }
        }

        info!(
            "Run finished: {} batches notified, {} failed",
            report.batches_notified, report.batches_failed
        );
        Ok(report)
    }

    /// Stage, summarize, format and notify; the staged ids are committed only
    /// once the notification has been delivered.
    async fn process_batch(&self, batch: &[Article], store: &mut ProcessedStore) -> Result<usize> {
        let staged = store.stage(batch.iter().map(|a| a.id.as_str()));
        debug!("Staged {} ids", staged.len());

        let summary = self.summarizer.summarize(batch).await?;
        let message = format_notification(&summary);
        self.notifier.notify(&message).await?;

        let committed = store.commit(staged, Utc::now());
        store.flush()?;
        Ok(committed)
    }
}

/// Drops articles already in the store. Order is preserved.
pub fn select_fresh(articles: Vec<Article>, store: &ProcessedStore) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| {
            if store.contains(&article.id) {
                info!("News already processed: {}", article.title);
                return false;
            }
            seen.insert(article.id.clone())
        })
        .collect()
}

/// Splits articles into batches of at most `max` entries, in order.
pub fn into_batches(articles: Vec<Article>, max: usize) -> Vec<Vec<Article>> {
    articles.chunks(max.max(1)).map(|chunk| chunk.to_vec()).collect()
}
