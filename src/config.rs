use crate::types::FetchConfig;
use std::env;
use std::path::PathBuf;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const OPENAI_MODEL_ENV: &str = "OPENAI_MODEL";
pub const SLACK_WEBHOOK_URL_ENV: &str = "SLACK_WEBHOOK_URL";

pub const DEFAULT_STATE_FILE: &str = "processed_news.json";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const DEFAULT_FEEDS: &[&str] = &[
    "https://qiita.com/popular-items/feed",
    "https://gigazine.net/news/rss_2.0/",
    "https://b.hatena.ne.jp/entrylist/it.rss",
    "https://dev.classmethod.jp/feed/",
    "https://news.microsoft.com/ja-jp/feed/",
    "https://aws.amazon.com/jp/about-aws/whats-new/recent/feed/",
    "https://zenn.dev/feed",
];

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "AI",
    "LLM",
    "generative",
    "生成AI",
    "生成系AI",
    "基盤モデル",
    "大規模言語モデル",
    "ChatGPT",
    "OpenAI",
    "Gemini",
    "Claude",
    "RAG",
];

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Per-article body limit in characters.
    pub max_content_chars: usize,
    pub timeout_seconds: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_content_chars: 300,
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub feeds: Vec<String>,
    pub keywords: Vec<String>,
    pub state_path: PathBuf,
    pub fetch: FetchConfig,
    pub openai: OpenAiConfig,
    pub slack_webhook_url: Option<String>,
    pub max_batch_articles: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            feeds: DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect(),
            keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            state_path: PathBuf::from(DEFAULT_STATE_FILE),
            fetch: FetchConfig::default(),
            openai: OpenAiConfig::default(),
            slack_webhook_url: None,
            max_batch_articles: 10,
        }
    }
}

impl DigestConfig {
    /// Defaults overlaid with credentials and endpoints from the environment.
    /// Missing credentials are left as `None`; they are reported when the
    /// component that needs them is constructed.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.openai.api_key = non_blank_env(OPENAI_API_KEY_ENV);
        config.slack_webhook_url = non_blank_env(SLACK_WEBHOOK_URL_ENV);
        if let Some(base_url) = non_blank_env(OPENAI_BASE_URL_ENV) {
            config.openai.base_url = base_url;
        }
        if let Some(model) = non_blank_env(OPENAI_MODEL_ENV) {
            config.openai.model = model;
        }
        config
    }
}

fn non_blank_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_original_feeds() {
        let config = DigestConfig::default();
        assert_eq!(config.feeds.len(), 7);
        assert!(config.keywords.iter().any(|k| k == "LLM"));
        assert_eq!(config.state_path, PathBuf::from("processed_news.json"));
        assert!(config.openai.api_key.is_none());
        assert!(config.slack_webhook_url.is_none());
    }
}
