//! HTTP client for the Anthropic Messages API.
//!
//! Wraps `reqwest` with typed request/response bodies, error-envelope
//! handling, and transient-error retry. Both calls this application makes
//! (venue discovery, venue research) go through [`AnthropicClient::send`]
//! with the hosted web-search tool enabled, and both consume the response
//! the same way: the `text` content blocks concatenated into one string,
//! with tool-use and search-result blocks skipped.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const WEB_SEARCH_TOOL_TYPE: &str = "web_search_20250305";
const WEB_SEARCH_TOOL_NAME: &str = "web_search";
const BACKOFF_BASE_MS: u64 = 1_000;

/// Errors returned by the Anthropic API client.
#[derive(Debug, thiserror::Error)]
pub enum AnthropicError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; `message` comes from the API error envelope when
    /// one is present, otherwise a bounded body snippet.
    #[error("Anthropic API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Client for `POST /v1/messages` with web search enabled.
///
/// Use [`AnthropicClient::new`] for production or
/// [`AnthropicClient::with_base_url`] to point at a mock server in tests.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    messages_url: Url,
    max_retries: u32,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
    tools: [ToolSpec; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ToolSpec {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'static str,
}

/// Response envelope. Only the content array matters here; with web
/// search enabled it interleaves `text`, `server_tool_use`, and
/// `web_search_tool_result` blocks, so every block is deserialized
/// loosely and non-text kinds are dropped.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`AnthropicError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64, max_retries: u32) -> Result<Self, AnthropicError> {
        Self::with_base_url(api_key, timeout_secs, max_retries, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (wiremock in tests, or a
    /// gateway/proxy in production).
    ///
    /// # Errors
    ///
    /// Returns [`AnthropicError::Http`] if the HTTP client cannot be
    /// constructed, or [`AnthropicError::Api`] if `base_url` is not a
    /// valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        max_retries: u32,
        base_url: &str,
    ) -> Result<Self, AnthropicError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("venuescout/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let normalized = format!("{}/v1/messages", base_url.trim_end_matches('/'));
        let messages_url = Url::parse(&normalized).map_err(|e| AnthropicError::Api {
            status: 0,
            message: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            messages_url,
            max_retries,
        })
    }

    /// Sends one user message and returns the concatenated text of the
    /// response, retrying transient failures with back-off.
    ///
    /// # Errors
    ///
    /// - [`AnthropicError::Api`] when the API rejects the request (after
    ///   retries, for 429/5xx).
    /// - [`AnthropicError::Http`] on network failure or timeout.
    /// - [`AnthropicError::Deserialize`] when a 2xx body does not match
    ///   the Messages response shape.
    pub async fn send(
        &self,
        prompt: &str,
        model: &str,
        max_tokens: u32,
    ) -> Result<String, AnthropicError> {
        crate::retry::with_backoff(self.max_retries, BACKOFF_BASE_MS, || {
            self.send_once(prompt, model, max_tokens)
        })
        .await
    }

    async fn send_once(
        &self,
        prompt: &str,
        model: &str,
        max_tokens: u32,
    ) -> Result<String, AnthropicError> {
        let body = MessagesRequest {
            model,
            max_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
            tools: [ToolSpec {
                kind: WEB_SEARCH_TOOL_TYPE,
                name: WEB_SEARCH_TOOL_NAME,
            }],
        };

        let response = self
            .client
            .post(self.messages_url.clone())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            return Err(AnthropicError::Api {
                status: status.as_u16(),
                message: extract_error_message(&raw),
            });
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&raw).map_err(|e| AnthropicError::Deserialize {
                context: "messages response".to_owned(),
                source: e,
            })?;

        Ok(collect_text(&parsed))
    }
}

/// Concatenates the text of all `text` content blocks, in order.
fn collect_text(response: &MessagesResponse) -> String {
    response
        .content
        .iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text.as_deref())
        .collect()
}

/// Pulls `error.message` out of the API error envelope, falling back to a
/// bounded snippet of the body when the envelope is absent or malformed.
fn extract_error_message(raw: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| {
            v.get("error")?
                .get("message")?
                .as_str()
                .map(str::to_owned)
        });

    message.unwrap_or_else(|| {
        let snippet: String = raw.chars().take(200).collect();
        if snippet.is_empty() {
            "empty response body".to_owned()
        } else {
            snippet
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(blocks: Vec<ContentBlock>) -> MessagesResponse {
        MessagesResponse { content: blocks }
    }

    fn text_block(text: &str) -> ContentBlock {
        ContentBlock {
            kind: "text".to_owned(),
            text: Some(text.to_owned()),
        }
    }

    #[test]
    fn collect_text_concatenates_in_order() {
        let response = response_with(vec![text_block("VENUE: A\n"), text_block("CITY: B")]);
        assert_eq!(collect_text(&response), "VENUE: A\nCITY: B");
    }

    #[test]
    fn collect_text_skips_tool_blocks() {
        let response = response_with(vec![
            text_block("before "),
            ContentBlock {
                kind: "server_tool_use".to_owned(),
                text: None,
            },
            ContentBlock {
                kind: "web_search_tool_result".to_owned(),
                text: None,
            },
            text_block("after"),
        ]);
        assert_eq!(collect_text(&response), "before after");
    }

    #[test]
    fn request_body_carries_web_search_tool() {
        let body = MessagesRequest {
            model: DEFAULT_MODEL,
            max_tokens: 6000,
            messages: [Message {
                role: "user",
                content: "find venues",
            }],
            tools: [ToolSpec {
                kind: WEB_SEARCH_TOOL_TYPE,
                name: WEB_SEARCH_TOOL_NAME,
            }],
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["max_tokens"], 6000);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["tools"][0]["type"], "web_search_20250305");
        assert_eq!(json["tools"][0]["name"], "web_search");
    }

    #[test]
    fn extract_error_message_reads_envelope() {
        let raw = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        assert_eq!(extract_error_message(raw), "invalid x-api-key");
    }

    #[test]
    fn extract_error_message_falls_back_to_snippet() {
        assert_eq!(extract_error_message("<html>nope</html>"), "<html>nope</html>");
        assert_eq!(extract_error_message(""), "empty response body");
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let with_slash =
            AnthropicClient::with_base_url("k", 30, 0, "https://api.anthropic.com/").unwrap();
        let without =
            AnthropicClient::with_base_url("k", 30, 0, "https://api.anthropic.com").unwrap();

        assert_eq!(
            with_slash.messages_url.as_str(),
            "https://api.anthropic.com/v1/messages"
        );
        assert_eq!(with_slash.messages_url, without.messages_url);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = AnthropicClient::with_base_url("k", 30, 0, "not a url");
        assert!(matches!(result, Err(AnthropicError::Api { .. })));
    }
}
