//! Claude API integration for worklog distribution.
//!
//! Provides a [`ClaudeScorer`] that estimates the relative complexity of
//! worklog entries, for use as the scorer behind smart distribution.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use wd_core::{ComplexityScore, ComplexityScorer, ScoreError, ScoreRequest};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const SCORING_MAX_TOKENS: u32 = 1024;
const SCORING_TEMPERATURE: f32 = 0.0;
/// Comments longer than this are cut before prompting.
const MAX_COMMENT_CHARS: usize = 500;

/// LLM client errors.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provided API key was invalid.
    #[error("invalid API key: {reason}")]
    InvalidApiKey { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error: {message}")]
    Api { message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<LlmError> for ScoreError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::InvalidResponse(message) => Self::Malformed(message),
            other => Self::Service(Box::new(other)),
        }
    }
}

/// Claude API client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_key: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client with the given API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    /// Creates a new client whose requests give up after `timeout`.
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let api_key = api_key.into();

        // Validate API key
        if api_key.is_empty() {
            return Err(LlmError::InvalidApiKey {
                reason: "API key cannot be empty",
            });
        }
        if api_key.trim().is_empty() {
            return Err(LlmError::InvalidApiKey {
                reason: "API key cannot be whitespace-only",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LlmError::ClientBuild)?;

        Ok(Self { http, api_key })
    }

    /// Asks Claude for a 1-10 complexity score per entry.
    ///
    /// Scores are returned as the model gave them; range and completeness
    /// checks are the resolver's job.
    pub async fn score_complexity(
        &self,
        model: &str,
        batch: &[ScoreRequest],
    ) -> Result<Vec<ComplexityScore>, LlmError> {
        let request = MessageRequest {
            model: model.to_string(),
            max_tokens: SCORING_MAX_TOKENS,
            temperature: SCORING_TEMPERATURE,
            messages: vec![Message {
                role: "user",
                content: build_scoring_prompt(batch),
            }],
        };

        let response = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(&body).unwrap_or_else(|| LlmError::Api {
                message: format!("status {status}: {body}"),
            }));
        }

        let payload: MessageResponse = serde_json::from_str(&body)
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;
        let text = extract_text(payload.content)?;
        let scores = parse_scores(&text)?;
        tracing::debug!(
            requested = batch.len(),
            returned = scores.len(),
            "received complexity scores"
        );
        Ok(scores)
    }
}

/// [`ComplexityScorer`] backed by the Claude Messages API.
#[derive(Debug, Clone)]
pub struct ClaudeScorer {
    client: Client,
    model: String,
}

impl ClaudeScorer {
    pub fn new(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl ComplexityScorer for ClaudeScorer {
    async fn score(&self, batch: &[ScoreRequest]) -> Result<Vec<ComplexityScore>, ScoreError> {
        Ok(self.client.score_complexity(&self.model, batch).await?)
    }
}

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
}

fn extract_text(blocks: Vec<ContentBlock>) -> Result<String, LlmError> {
    let mut pieces = Vec::new();
    for block in blocks {
        let ContentBlock::Text { text } = block;
        pieces.push(text);
    }
    if pieces.is_empty() {
        return Err(LlmError::InvalidResponse(
            "missing text content".to_string(),
        ));
    }
    Ok(pieces.join("\n"))
}

fn parse_api_error(body: &str) -> Option<LlmError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| LlmError::Api {
            message: payload.error.message,
        })
}

fn build_scoring_prompt(batch: &[ScoreRequest]) -> String {
    let mut lines = Vec::new();
    lines.push(
        "You are a time-tracking assistant. Estimate the relative complexity of each worklog entry."
            .to_string(),
    );
    lines.push("Return strict JSON: [{\"id\":\"...\",\"score\":5}]".to_string());
    lines.push("Rules:".to_string());
    lines.push("- Score every entry exactly once, using its id.".to_string());
    lines.push("- Scores are integers from 1 to 10.".to_string());
    lines.push(
        "- 1-2 trivial, 3-4 small, 5-6 medium, 7-8 complex, 9-10 very complex.".to_string(),
    );
    lines.push("- Judge task size only; ignore how long was logged.".to_string());
    lines.push(String::new());
    for request in batch {
        lines.push(format!("id: {}", request.id));
        lines.push(format!("label: {}", request.label.trim()));
        let comment = request.comment_text.trim();
        if comment.is_empty() {
            lines.push("comment: (none)".to_string());
        } else {
            lines.push(format!("comment: {}", truncate_chars(comment, MAX_COMMENT_CHARS)));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Parses the model's answer into raw scores.
///
/// Accepts a bare array, a `{"scores": [...]}` wrapper, and either wrapped
/// in a Markdown code fence. Items without a usable id or numeric score are
/// skipped; anything that is not a list at all is an error.
fn parse_scores(text: &str) -> Result<Vec<ComplexityScore>, LlmError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("scores") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(LlmError::InvalidResponse(
                    "expected a \"scores\" array".to_string(),
                ));
            }
        },
        _ => {
            return Err(LlmError::InvalidResponse(
                "expected a JSON array of scores".to_string(),
            ));
        }
    };

    Ok(items.iter().filter_map(parse_score_item).collect())
}

fn parse_score_item(item: &Value) -> Option<ComplexityScore> {
    let id = match item.get("id")? {
        Value::String(id) => id.trim().to_string(),
        Value::Number(id) => id.to_string(),
        _ => return None,
    };
    let score = match item.get("score")? {
        Value::Number(score) => score.as_f64()?,
        Value::String(score) => score.trim().parse().ok()?,
        _ => return None,
    };
    Some(ComplexityScore::new(id, score))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line, e.g. ```json
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str, label: &str, comment: &str) -> ScoreRequest {
        ScoreRequest {
            id: id.to_string(),
            label: label.to_string(),
            comment_text: comment.to_string(),
        }
    }

    #[test]
    fn client_rejects_empty_api_key() {
        assert!(matches!(
            Client::new(""),
            Err(LlmError::InvalidApiKey { .. })
        ));
    }

    #[test]
    fn client_rejects_whitespace_api_key() {
        assert!(matches!(
            Client::new("   "),
            Err(LlmError::InvalidApiKey { .. })
        ));
    }

    #[test]
    fn client_accepts_valid_api_key() {
        assert!(Client::new("sk-ant-api03-valid-key").is_ok());
    }

    #[test]
    fn client_debug_redacts_api_key() {
        let client = Client::new("secret-key").unwrap();
        let scorer = ClaudeScorer::new(client.clone(), "claude-sonnet-4-20250514");
        for debug in [format!("{client:?}"), format!("{scorer:?}")] {
            assert!(!debug.contains("secret-key"));
            assert!(debug.contains("[REDACTED]"));
        }
    }

    #[test]
    fn build_scoring_prompt_lists_every_entry() {
        let batch = vec![
            request("10001", "Fix login redirect", "Traced cookie domain bug"),
            request("10002", " Standup ", ""),
        ];
        let prompt = build_scoring_prompt(&batch);
        assert!(prompt.contains("id: 10001\nlabel: Fix login redirect\ncomment: Traced cookie domain bug"));
        assert!(prompt.contains("id: 10002\nlabel: Standup\ncomment: (none)"));
        assert!(prompt.contains("1-2 trivial"));
    }

    #[test]
    fn build_scoring_prompt_truncates_long_comments() {
        let batch = vec![request("1", "Refactor", &"é".repeat(MAX_COMMENT_CHARS + 20))];
        let prompt = build_scoring_prompt(&batch);
        let expected = format!("comment: {}...", "é".repeat(MAX_COMMENT_CHARS));
        assert!(prompt.contains(&expected));
        assert!(!prompt.contains(&"é".repeat(MAX_COMMENT_CHARS + 1)));
    }

    #[test]
    fn parse_scores_accepts_bare_array() {
        let parsed = parse_scores(r#"[{"id":"a","score":7},{"id":"b","score":2.5}]"#).unwrap();
        assert_eq!(
            parsed,
            vec![ComplexityScore::new("a", 7.0), ComplexityScore::new("b", 2.5)]
        );
    }

    #[test]
    fn parse_scores_accepts_fenced_wrapper_object() {
        let text = "```json\n{\"scores\":[{\"id\":10001,\"score\":\"4\"}]}\n```";
        let parsed = parse_scores(text).unwrap();
        assert_eq!(parsed, vec![ComplexityScore::new("10001", 4.0)]);
    }

    #[test]
    fn parse_scores_skips_malformed_items() {
        let text = r#"[{"id":"a","score":"high"},{"score":3},{"id":"b"},{"id":"c","score":12}]"#;
        let parsed = parse_scores(text).unwrap();
        assert_eq!(parsed, vec![ComplexityScore::new("c", 12.0)]);
    }

    #[test]
    fn parse_scores_rejects_invalid_json() {
        let err = parse_scores("not-json").unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn parse_scores_rejects_non_list_payload() {
        assert!(matches!(
            parse_scores(r#"{"summary":"done"}"#),
            Err(LlmError::InvalidResponse(_))
        ));
        assert!(matches!(parse_scores("42"), Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn parse_api_error_reads_message() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let err = parse_api_error(body).unwrap();
        assert_eq!(err.to_string(), "API error: Overloaded");
    }

    #[test]
    fn invalid_response_maps_to_malformed_score_error() {
        let err: ScoreError = LlmError::InvalidResponse("bad".to_string()).into();
        assert!(matches!(err, ScoreError::Malformed(message) if message == "bad"));

        let err: ScoreError = LlmError::Api {
            message: "Overloaded".to_string(),
        }
        .into();
        assert!(matches!(err, ScoreError::Service(_)));
        assert_eq!(err.to_string(), "scoring service failed: API error: Overloaded");
    }
}
