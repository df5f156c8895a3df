#![allow(dead_code)]

// Shared fixtures for the integration tests
pub use ai_news_digest::{DigestConfig, DigestPipeline, ProcessedStore};

use serde_json::{json, Value};
use std::sync::Once;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const FEED_PATH: &str = "/feed.xml";
pub const MODEL_PATH: &str = "/chat/completions";
pub const WEBHOOK_PATH: &str = "/webhook";

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// RSS 2.0 document with one item per (title, link).
pub fn rss(items: &[(&str, &str)]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test feed</title><link>https://example.com</link><description>Test</description>"#,
    );
    for (title, link) in items {
        body.push_str(&format!(
            "<item><title>{}</title><link>{}</link><description>{} description</description><pubDate>Wed, 01 May 2024 12:00:00 GMT</pubDate></item>",
            title, link, title
        ));
    }
    body.push_str("</channel></rss>");
    body
}

/// Chat completion whose message content is `content` serialized as a string.
pub fn completion(content: &Value) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1714564800,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content.to_string(),
                "refusal": null
            },
            "finish_reason": "stop"
        }]
    })
}

pub fn stub_summary() -> Value {
    json!({"overall_summary": "X", "points": [{"title": "A", "description": "B"}]})
}

/// Config pointing every outbound call at `server`.
pub fn test_config(server: &MockServer, state_path: std::path::PathBuf) -> DigestConfig {
    let mut config = DigestConfig::default();
    config.feeds = vec![format!("{}{}", server.uri(), FEED_PATH)];
    config.keywords = vec!["LLM".to_string()];
    config.state_path = state_path;
    config.openai.api_key = Some("test-api-key".to_string());
    config.openai.base_url = server.uri();
    config.slack_webhook_url = Some(format!("{}{}", server.uri(), WEBHOOK_PATH));
    config.fetch.timeout_seconds = 5;
    config.openai.timeout_seconds = 5;
    config
}

pub async fn mount_feed(server: &MockServer, feed_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(feed_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/rss+xml"))
        .mount(server)
        .await;
}

pub async fn mount_model(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(response)
        .mount(server)
        .await;
}

pub async fn mount_webhook(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(if status == 200 { "ok" } else { "error" }))
        .mount(server)
        .await;
}

pub async fn requests_to(server: &MockServer, request_path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == request_path)
        .collect()
}

pub fn json_body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).expect("request body is JSON")
}
