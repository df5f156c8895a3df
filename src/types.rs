use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single news entry as fetched from a feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub source_feed: String,
}

impl Article {
    pub fn new(
        title: String,
        link: Option<String>,
        published_at: Option<DateTime<Utc>>,
        source_feed: String,
    ) -> Self {
        let id = Self::derive_id(&title, link.as_deref(), published_at);
        Self {
            id,
            title,
            link,
            summary: None,
            content: None,
            published_at,
            source_feed,
        }
    }

    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_content(mut self, content: Option<String>) -> Self {
        self.content = content;
        self
    }

    /// Identity is the link; entries without one fall back to title + publish time.
    pub fn derive_id(title: &str, link: Option<&str>, published_at: Option<DateTime<Utc>>) -> String {
        match link.map(str::trim).filter(|l| !l.is_empty()) {
            Some(link) => link.to_string(),
            None => format!(
                "{}#{}",
                title.trim(),
                published_at.map(|p| p.to_rfc3339()).unwrap_or_default()
            ),
        }
    }

    /// Body text sent to the model: content if present, otherwise the feed summary.
    pub fn body(&self) -> &str {
        self.content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self.summary.as_deref())
            .unwrap_or("")
    }
}

/// One titled point of a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryPoint {
    pub title: String,
    pub description: String,
}

/// Structured model output. Deserialization rejects missing, mistyped and unknown fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewsSummary {
    pub overall_summary: String,
    pub points: Vec<SummaryPoint>,
}

impl NewsSummary {
    /// Checks the constraints serde cannot express: non-empty strings and points.
    pub fn validate(&self) -> Result<()> {
        if self.overall_summary.trim().is_empty() {
            return Err(DigestError::SchemaValidation(
                "overall_summary must be a non-empty string".to_string(),
            ));
        }
        if self.points.is_empty() {
            return Err(DigestError::SchemaValidation(
                "points must contain at least one entry".to_string(),
            ));
        }
        for (i, point) in self.points.iter().enumerate() {
            if point.title.trim().is_empty() {
                return Err(DigestError::SchemaValidation(format!(
                    "points[{}].title must be a non-empty string",
                    i
                )));
            }
            if point.description.trim().is_empty() {
                return Err(DigestError::SchemaValidation(format!(
                    "points[{}].description must be a non-empty string",
                    i
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_redirects: usize,
    pub max_feed_size_mb: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "AI-News-Digest/0.1".to_string(),
            timeout_seconds: 30,
            max_redirects: 5,
            max_feed_size_mb: 10,
        }
    }
}

/// Counters for a single pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub feeds_fetched: usize,
    pub feeds_failed: usize,
    pub articles_seen: usize,
    pub articles_relevant: usize,
    pub articles_fresh: usize,
    pub batches_notified: usize,
    pub batches_failed: usize,
    pub articles_committed: usize,
}

impl RunReport {
    pub fn nothing_new(&self) -> bool {
        self.articles_fresh == 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("{name} is not set")]
    MissingCredential { name: &'static str },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to fetch feed {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Summary failed schema validation: {0}")]
    SchemaValidation(String),

    #[error("Upstream call failed: {0}")]
    Upstream(String),

    #[error("Notification delivery failed: {0}")]
    NotificationDelivery(String),

    #[error("Processed news store error ({path}): {reason}")]
    Persistence { path: PathBuf, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DigestError {
    /// Fatal errors abort the whole run; everything else is isolated to a feed or batch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DigestError::MissingCredential { .. }
                | DigestError::Config(_)
                | DigestError::Persistence { .. }
        )
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, DigestError::MissingCredential { .. } | DigestError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, DigestError>;
