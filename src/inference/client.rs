//! Decision Inference Client
//!
//! Wraps an OpenAI-compatible /v1/chat/completions endpoint. Each call
//! asks for a JSON object and parses it into a `Decision`; token usage
//! comes back alongside for observability. Unknown action values
//! deserialize to `wait`, so the model cannot name an action this
//! agent does not have.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::types::{Decision, DecisionClient, DecisionResponse, TokenUsage};

/// Inference client for OpenAI-compatible chat completions.
pub struct InferenceHttpClient {
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    http: Client,
}

impl InferenceHttpClient {
    pub fn new(api_url: String, api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            api_url,
            api_key,
            model,
            max_tokens,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl DecisionClient for InferenceHttpClient {
    /// Send one chat completion request and return the parsed decision.
    async fn decide(&self, system_prompt: &str, context: &str) -> Result<DecisionResponse> {
        // Newer models (o-series, gpt-5.x, gpt-4.1) use max_completion_tokens
        let uses_completion_tokens = regex::Regex::new(r"^(o[1-9]|gpt-5|gpt-4\.1)")
            .map(|re| re.is_match(&self.model))
            .unwrap_or(false);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": context },
            ],
            "response_format": { "type": "json_object" },
            "stream": false,
        });

        if uses_completion_tokens {
            body["max_completion_tokens"] = serde_json::json!(self.max_tokens);
        } else {
            body["max_tokens"] = serde_json::json!(self.max_tokens);
        }

        let url = format!("{}/v1/chat/completions", self.api_url);
        let resp = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("Inference request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Inference error: {}: {}", status.as_u16(), text);
        }

        let data: Value = resp
            .json()
            .await
            .context("Failed to parse inference response")?;

        let choice = data["choices"]
            .get(0)
            .ok_or_else(|| anyhow::anyhow!("No completion choice returned from inference"))?;

        let content = choice["message"]["content"].as_str().unwrap_or("");
        let decision = parse_decision(content)?;

        let usage = TokenUsage {
            prompt_tokens: data["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            completion_tokens: data["usage"]["completion_tokens"].as_u64().unwrap_or(0),
            total_tokens: data["usage"]["total_tokens"].as_u64().unwrap_or(0),
        };

        Ok(DecisionResponse {
            decision,
            usage,
            model: data["model"].as_str().unwrap_or(&self.model).to_string(),
        })
    }
}

/// Parse the model's reply into a `Decision`.
///
/// Some models wrap JSON in markdown fences even when asked for a raw
/// object, so fences are stripped before parsing. A reply that is not
/// a decision at all is an error the caller treats as an implicit wait.
pub fn parse_decision(content: &str) -> Result<Decision> {
    let trimmed = strip_code_fences(content.trim());

    serde_json::from_str::<Decision>(trimmed)
        .with_context(|| format!("Malformed decision output: {}", crate::types::truncate_chars(trimmed, 120)))
}

fn strip_code_fences(text: &str) -> &str {
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionKind;

    #[test]
    fn test_parse_plain_decision() {
        let decision = parse_decision(
            r#"{"reasoning":"quality post on curve dynamics","action":"upvote","postId":"p1"}"#,
        )
        .unwrap();
        assert_eq!(decision.action, ActionKind::Upvote);
        assert_eq!(decision.post_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_parse_fenced_decision() {
        let content = "```json\n{\"reasoning\":\"nothing to add\",\"action\":\"wait\"}\n```";
        let decision = parse_decision(content).unwrap();
        assert_eq!(decision.action, ActionKind::Wait);
    }

    #[test]
    fn test_parse_unknown_action_becomes_wait() {
        let decision =
            parse_decision(r#"{"reasoning":"let's downvote","action":"downvote"}"#).unwrap();
        assert_eq!(decision.action, ActionKind::Wait);
    }

    #[test]
    fn test_parse_malformed_output_is_an_error() {
        assert!(parse_decision("I think I should post something!").is_err());
        assert!(parse_decision("").is_err());
    }

    #[test]
    fn test_parse_decision_with_post_fields() {
        let decision = parse_decision(
            r#"{"reasoning":"unique insight","action":"post","title":"On drawdowns","content":"Risk is not volatility.","submolt":"quant"}"#,
        )
        .unwrap();
        assert_eq!(decision.action, ActionKind::Post);
        assert_eq!(decision.submolt.as_deref(), Some("quant"));
    }
}
