use crate::types::Article;
use tracing::debug;

/// Decides whether an article is worth summarizing. Implementations must be
/// deterministic: the same article always yields the same decision.
pub trait RelevanceFilter: Send + Sync {
    fn filter_name(&self) -> String;

    fn is_relevant(&self, article: &Article) -> bool;
}

/// Case-insensitive keyword match over title and summary text.
///
/// A keyword only counts when it is not glued to other ASCII letters or
/// digits, so `AI` matches "生成AIの" or "AI-powered" but not "said".
pub struct KeywordFilter {
    keywords: Vec<(String, String)>, // (original, lowercased)
}

impl KeywordFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| {
                let k: String = k.into();
                k.trim().to_string()
            })
            .filter(|k| !k.is_empty())
            .map(|k| {
                let lower = k.to_lowercase();
                (k, lower)
            })
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|(k, _)| k.as_str())
    }

    /// First configured keyword found in the article, if any.
    pub fn matched_keyword(&self, article: &Article) -> Option<&str> {
        let mut haystack = article.title.to_lowercase();
        if let Some(summary) = &article.summary {
            haystack.push('\n');
            haystack.push_str(&summary.to_lowercase());
        }

        self.keywords
            .iter()
            .find(|(_, lower)| contains_keyword(&haystack, lower))
            .map(|(original, _)| original.as_str())
    }
}

impl RelevanceFilter for KeywordFilter {
    fn filter_name(&self) -> String {
        format!("keyword ({} keywords)", self.keywords.len())
    }

    fn is_relevant(&self, article: &Article) -> bool {
        match self.matched_keyword(article) {
            Some(keyword) => {
                debug!("Relevant ({}): {}", keyword, article.title);
                true
            }
            None => {
                debug!("Not relevant: {}", article.title);
                false
            }
        }
    }
}

fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    haystack.match_indices(keyword).any(|(start, matched)| {
        let end = start + matched.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !glued(before, keyword.chars().next()) && !glued(after, keyword.chars().next_back())
    })
}

// Only ASCII word characters on both sides of the seam form a longer word.
fn glued(neighbour: Option<char>, edge: Option<char>) -> bool {
    match (neighbour, edge) {
        (Some(n), Some(e)) => n.is_ascii_alphanumeric() && e.is_ascii_alphanumeric(),
        _ => false,
    }
}
