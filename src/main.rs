use ai_news_digest::{DigestConfig, DigestPipeline, ProcessedStore};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Summarize new AI/LLM news from RSS feeds and post the digest to Slack.
#[derive(Debug, Parser)]
#[command(name = "ai-news-digest", version, about)]
struct Cli {
    /// Processed-news record file
    #[arg(long, value_name = "PATH")]
    state_file: Option<PathBuf>,

    /// Feed URL to read (repeatable, replaces the built-in list)
    #[arg(long = "feed", value_name = "URL")]
    feeds: Vec<String>,

    /// Relevance keyword (repeatable, replaces the built-in list)
    #[arg(long = "keyword", value_name = "WORD")]
    keywords: Vec<String>,

    /// Chat model used for summaries
    #[arg(long)]
    model: Option<String>,

    /// Maximum articles per summary request
    #[arg(long, value_name = "N")]
    max_batch_articles: Option<usize>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> DigestConfig {
        let mut config = DigestConfig::from_env();
        if let Some(path) = self.state_file {
            config.state_path = path;
        }
        if !self.feeds.is_empty() {
            config.feeds = self.feeds;
        }
        if !self.keywords.is_empty() {
            config.keywords = self.keywords;
        }
        if let Some(model) = self.model {
            config.openai.model = model;
        }
        if let Some(max) = self.max_batch_articles {
            config.max_batch_articles = max;
        }
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    ExitCode::from(exit_status(&run(cli.into_config()).await))
}

/// 0 for a completed run (isolated feed or batch failures included), 1 when the run aborted.
fn exit_status(result: &anyhow::Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

async fn run(config: DigestConfig) -> anyhow::Result<()> {
    info!("Starting AI news digest");

    let mut pipeline = DigestPipeline::from_config(&config).context("configuration error")?;

    let mut store = ProcessedStore::load(&config.state_path).context("failed to load processed news")?;

    let report = pipeline.run(&mut store).await.context("run aborted")?;

    store.flush().context("failed to save processed news")?;

    info!(
        "Done: {} articles seen, {} relevant, {} new, {} batches notified, {} failed",
        report.articles_seen,
        report.articles_relevant,
        report.articles_fresh,
        report.batches_notified,
        report.batches_failed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test</title><link>https://example.com</link><description>Test</description>
<item><title>Rust 1.80 released</title><link>https://example.com/rust</link></item>
</channel></rss>"#;

    fn config(server: &MockServer, dir: &TempDir) -> DigestConfig {
        let mut config = DigestConfig::default();
        config.feeds = vec![format!("{}/feed.xml", server.uri())];
        config.keywords = vec!["LLM".to_string()];
        config.state_path = dir.path().join("processed_news.json");
        config.openai.api_key = Some("test-api-key".to_string());
        config.openai.base_url = server.uri();
        config.slack_webhook_url = Some(format!("{}/webhook", server.uri()));
        config
    }

    #[tokio::test]
    async fn clean_run_exits_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(FEED, "application/rss+xml"))
            .expect(1)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();

        let result = run(config(&server, &dir)).await;
        assert_eq!(exit_status(&result), 0);
    }

    #[tokio::test]
    async fn unreachable_feed_still_exits_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();

        let result = run(config(&server, &dir)).await;
        assert_eq!(exit_status(&result), 0);
    }

    #[tokio::test]
    async fn missing_credential_exits_non_zero_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
            .expect(0)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();

        let strips: [fn(&mut DigestConfig); 2] = [
            |c| c.openai.api_key = None,
            |c| c.slack_webhook_url = None,
        ];
        for strip in strips {
            let mut config = config(&server, &dir);
            strip(&mut config);
            let result = run(config).await;
            assert!(result.is_err());
            assert_eq!(exit_status(&result), 1);
        }
        assert!(!dir.path().join("processed_news.json").exists());
    }

    #[tokio::test]
    async fn corrupt_state_file_exits_non_zero() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let config = config(&server, &dir);
        std::fs::write(&config.state_path, "{not json").unwrap();

        let result = run(config).await;
        assert_eq!(exit_status(&result), 1);
    }
}
