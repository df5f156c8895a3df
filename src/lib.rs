pub mod types;
pub mod config;
pub mod fetcher;
pub mod parser;
pub mod aggregator;
pub mod filter;
pub mod store;
pub mod summarizer;
pub mod formatter;
pub mod notifier;
pub mod pipeline;

pub use types::*;
pub use config::{DigestConfig, OpenAiConfig};
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use aggregator::{FeedAggregator, FeedCollection};
pub use filter::{KeywordFilter, RelevanceFilter};
pub use store::{ProcessedStore, StagedCommit};
pub use summarizer::{OpenAiSummarizer, SummaryModel};
pub use formatter::format_notification;
pub use notifier::{Notifier, SlackNotifier};
pub use pipeline::DigestPipeline;
