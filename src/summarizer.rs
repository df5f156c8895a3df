use crate::config::{OpenAiConfig, OPENAI_API_KEY_ENV};
use crate::types::{Article, DigestError, NewsSummary, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const SCHEMA_NAME: &str = "news_summary";

const SYSTEM_PROMPT: &str = "\
あなたはAI・LLM関連ニュースの編集者です。与えられた記事群をまとめて日本語で要約してください。
<制約条件>
- overall_summary には記事群全体の要約を100字程度で記述してください。
- points には要点を3~5つに絞り、各要点の見出しを title、まとめを description に記述してください。
- 指定されたJSONスキーマ以外の内容は出力しないでください。";

/// Produces a validated [`NewsSummary`] for one batch of articles.
#[async_trait]
pub trait SummaryModel: Send + Sync {
    fn model_name(&self) -> String;

    /// One attempt per batch. Failures are `Upstream` (the call itself) or
    /// `SchemaValidation` (the call succeeded but the reply does not fit the schema).
    async fn summarize(&self, articles: &[Article]) -> Result<NewsSummary>;
}

/// JSON schema sent as the structured output contract.
pub fn summary_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "overall_summary": {
                "type": "string",
                "description": "Summary of the whole batch, about 100 characters"
            },
            "points": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "description": { "type": "string" }
                    },
                    "required": ["title", "description"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["overall_summary", "points"],
        "additionalProperties": false
    })
}

/// Parses and validates a model reply. Nothing is defaulted.
pub fn parse_summary(raw: &str) -> Result<NewsSummary> {
    let summary: NewsSummary = serde_json::from_str(raw.trim())
        .map_err(|e| DigestError::SchemaValidation(e.to_string()))?;
    summary.validate()?;
    Ok(summary)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// Chat Completions client with `json_schema` structured output.
pub struct OpenAiSummarizer {
    client: Client,
    api_key: String,
    endpoint: Url,
    model: String,
    max_content_chars: usize,
}

impl std::fmt::Debug for OpenAiSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiSummarizer")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiSummarizer {
    /// Fails with `MissingCredential` before any network activity when the key is absent.
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(DigestError::MissingCredential {
                name: OPENAI_API_KEY_ENV,
            })?
            .to_string();

        let endpoint = Url::parse(&format!("{}/chat/completions", config.base_url.trim_end_matches('/')))
            .map_err(|e| DigestError::Config(format!("invalid OpenAI base URL '{}': {}", config.base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint,
            model: config.model.clone(),
            max_content_chars: config.max_content_chars,
        })
    }

    fn build_prompt(&self, articles: &[Article]) -> String {
        let mut prompt = String::from("<Content>\n");
        for (i, article) in articles.iter().enumerate() {
            prompt.push_str(&format!("## 記事{}\n", i + 1));
            prompt.push_str(&format!("タイトル: {}\n", article.title));
            if let Some(link) = &article.link {
                prompt.push_str(&format!("URL: {}\n", link));
            }
            let body = truncate_chars(article.body(), self.max_content_chars);
            if !body.is_empty() {
                prompt.push_str(&format!("本文: {}\n", body));
            }
            prompt.push('\n');
        }
        prompt
    }

    fn build_request(&self, articles: &[Article]) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: self.build_prompt(articles),
                },
            ],
            response_format: json!({
                "type": "json_schema",
                "json_schema": {
                    "name": SCHEMA_NAME,
                    "strict": true,
                    "schema": summary_schema(),
                }
            }),
        }
    }
}

#[async_trait]
impl SummaryModel for OpenAiSummarizer {
    fn model_name(&self) -> String {
        format!("OpenAI ({})", self.model)
    }

    async fn summarize(&self, articles: &[Article]) -> Result<NewsSummary> {
        if articles.is_empty() {
            return Err(DigestError::SchemaValidation("no articles to summarize".to_string()));
        }

        let request = self.build_request(articles);
        debug!("summary_prompt: {}", request.messages[1].content);
        info!("Requesting summary of {} articles from {}", articles.len(), self.model);

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DigestError::Upstream(format!("model request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DigestError::Upstream(format!("failed to read model response: {}", e)))?;

        if !status.is_success() {
            return Err(DigestError::Upstream(format!(
                "model API returned HTTP {}: {}",
                status.as_u16(),
                truncate_chars(&body, 200)
            )));
        }

        let completion: ChatCompletion = serde_json::from_str(&body)
            .map_err(|e| DigestError::Upstream(format!("malformed completion response: {}", e)))?;

        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| DigestError::Upstream("completion response has no choices".to_string()))?;

        if let Some(refusal) = message.refusal {
            return Err(DigestError::SchemaValidation(format!("model refused: {}", refusal)));
        }

        let content = message
            .content
            .ok_or_else(|| DigestError::SchemaValidation("completion has no content".to_string()))?;

        let summary = parse_summary(&content)?;
        info!("Received summary with {} points", summary.points.len());
        Ok(summary)
    }
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
