use crate::types::{Article, DigestError, Result};
use feed_rs::model::Text;
use feed_rs::parser;
use scraper::Html;
use std::collections::HashSet;
use tracing::{debug, info};

/// Turns feed documents into [`Article`]s, dropping entries already seen earlier in the run.
pub struct FeedParser {
    seen_ids: HashSet<String>,
}

impl FeedParser {
    pub fn new() -> Self {
        Self {
            seen_ids: HashSet::new(),
        }
    }

    pub fn parse_feed(&mut self, content: &str, source_feed: &str) -> Result<Vec<Article>> {
        debug!("Parsing feed content ({} bytes) from {}", content.len(), source_feed);

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| DigestError::Parse(format!("Failed to parse feed {}: {}", source_feed, e)))?;

        let mut articles = Vec::new();
        for entry in feed.entries {
            if let Some(article) = self.parse_entry(entry, source_feed) {
                articles.push(article);
            }
        }

        info!("Parsed {} entries from {}", articles.len(), source_feed);
        Ok(articles)
    }

    fn parse_entry(&mut self, entry: feed_rs::model::Entry, source_feed: &str) -> Option<Article> {
        let title = entry
            .title
            .map(|t| text_content(&t))
            .filter(|t| !t.is_empty());
        let link = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .filter(|l| !l.is_empty());

        // Without a link the title is the only stable identity
        let title = match (title, &link) {
            (Some(title), _) => title,
            (None, Some(_)) => "Untitled".to_string(),
            (None, None) => {
                debug!("Skipping entry without title or link in {}", source_feed);
                return None;
            }
        };

        let published_at = entry.published.or(entry.updated);
        let summary = entry
            .summary
            .map(|s| text_content(&s))
            .filter(|s| !s.is_empty());
        let content = entry
            .content
            .and_then(|c| {
                let markup = is_markup(c.content_type.essence_str());
                c.body.map(|body| if markup { strip_html(&body) } else { collapse_whitespace(&body) })
            })
            .filter(|b| !b.is_empty());

        let article = Article::new(title, link, published_at, source_feed.to_string())
            .with_summary(summary)
            .with_content(content);

        if !self.seen_ids.insert(article.id.clone()) {
            debug!("Skipping duplicate entry: {}", article.id);
            return None;
        }

        Some(article)
    }

    pub fn clear_deduplication_cache(&mut self) {
        self.seen_ids.clear();
        debug!("Cleared deduplication cache");
    }
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new()
    }
}

// feed-rs has already unescaped the XML, so only html bodies still carry markup
fn text_content(text: &Text) -> String {
    if is_markup(text.content_type.essence_str()) {
        strip_html(&text.content)
    } else {
        collapse_whitespace(&text.content)
    }
}

fn is_markup(essence: &str) -> bool {
    matches!(essence, "text/html" | "application/xhtml+xml")
}

/// Drops markup, decodes entities (named and numeric) and collapses whitespace.
pub fn strip_html(input: &str) -> String {
    let fragment = Html::parse_fragment(input);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
