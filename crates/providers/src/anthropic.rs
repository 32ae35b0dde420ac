//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly.
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks

use async_trait::async_trait;
use serde::Deserialize;
use shopdesk_core::error::ProviderError;
use shopdesk_core::message::ContentBlock;
use shopdesk_core::provider::*;
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with a per-request timeout.
    pub fn new(
        api_key: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the Messages API request body.
    fn request_body(request: &ModelRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "max_tokens": request.max_tokens,
        });

        if let Some(ref sys) = request.system {
            body["system"] = serde_json::json!(sys);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(request.tools);
        }

        if let Some(t) = request.temperature {
            body["temperature"] = serde_json::json!(t);
        }

        body
    }

    /// Convert Anthropic API response to our ModelResponse.
    fn into_model_response(resp: AnthropicResponse) -> ModelResponse {
        ModelResponse {
            id: resp.id,
            model: resp.model,
            content: resp.content,
            // A missing stop_reason only happens mid-stream; treat it as a final answer.
            stop_reason: resp.stop_reason.unwrap_or(StopReason::EndTurn),
            usage: Some(Usage {
                input_tokens: resp.usage.input_tokens,
                output_tokens: resp.usage.output_tokens,
            }),
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ModelRequest,
    ) -> std::result::Result<ModelResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = Self::request_body(&request);

        debug!(
            provider = "anthropic",
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(5);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid Anthropic API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Anthropic API error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: AnthropicResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse Anthropic response: {e}"))
        })?;

        debug!(
            stop_reason = ?api_resp.stop_reason,
            blocks = api_resp.content.len(),
            "Anthropic response received"
        );

        Ok(Self::into_model_response(api_resp))
    }
}

// --- Anthropic API types ---

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    id: String,
    model: String,
    content: Vec<ContentBlock>,
    usage: AnthropicUsage,
    #[serde(default)]
    stop_reason: Option<StopReason>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopdesk_core::message::ChatMessage;
    use shopdesk_core::tool::ToolResult;
    use std::time::Duration;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new("sk-ant-test", Duration::from_secs(5)).unwrap()
    }

    fn request(messages: Vec<ChatMessage>) -> ModelRequest {
        ModelRequest {
            model: "claude-haiku-4-5-20251001".into(),
            system: Some("You are a support agent".into()),
            messages,
            tools: vec![ToolDefinition {
                name: "get_order".into(),
                description: "Gets a single order".into(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {"order_id": {"type": "string"}},
                    "required": ["order_id"]
                }),
            }],
            max_tokens: 1024,
            temperature: None,
        }
    }

    #[test]
    fn constructor() {
        let p = provider();
        assert_eq!(p.name(), "anthropic");
        assert_eq!(p.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn constructor_with_base_url() {
        let p = provider().with_base_url("https://custom.proxy.com/");
        assert_eq!(p.base_url, "https://custom.proxy.com");
    }

    #[test]
    fn body_puts_system_and_tools_at_top_level() {
        let body = AnthropicProvider::request_body(&request(vec![ChatMessage::user("hi")]));
        assert_eq!(body["system"], "You are a support agent");
        assert_eq!(body["tools"][0]["name"], "get_order");
        assert_eq!(body["tools"][0]["input_schema"]["type"], "object");
        assert_eq!(body["max_tokens"], 1024);
        assert!(body.get("temperature").is_none());
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn body_replays_tool_exchange_as_blocks() {
        let messages = vec![
            ChatMessage::user("Where is order 1001?"),
            ChatMessage::assistant_blocks(vec![ContentBlock::ToolUse {
                id: "toolu_1".into(),
                name: "get_order".into(),
                input: serde_json::json!({"order_id": "1001"}),
            }]),
            ChatMessage::tool_results(vec![ToolResult {
                tool_use_id: "toolu_1".into(),
                content: r#"{"status":"no_match"}"#.into(),
            }]),
        ];
        let body = AnthropicProvider::request_body(&request(messages));
        let msgs = body["messages"].as_array().unwrap();
        assert_eq!(msgs[1]["role"], "assistant");
        assert_eq!(msgs[1]["content"][0]["type"], "tool_use");
        assert_eq!(msgs[1]["content"][0]["id"], "toolu_1");
        assert_eq!(msgs[2]["role"], "user");
        assert_eq!(msgs[2]["content"][0]["type"], "tool_result");
        assert_eq!(msgs[2]["content"][0]["tool_use_id"], "toolu_1");
    }

    #[test]
    fn parse_text_response() {
        let resp: AnthropicResponse = serde_json::from_str(
            r#"{
                "id": "msg_01",
                "model": "claude-haiku-4-5-20251001",
                "content": [{"type": "text", "text": "Hello!", "citations": null}],
                "usage": {"input_tokens": 10, "output_tokens": 5},
                "stop_reason": "end_turn"
            }"#,
        )
        .unwrap();

        let mr = AnthropicProvider::into_model_response(resp);
        assert_eq!(mr.text_fragments(), vec!["Hello!"]);
        assert_eq!(mr.stop_reason, StopReason::EndTurn);
        assert_eq!(mr.usage.unwrap().output_tokens, 5);
    }

    #[test]
    fn parse_tool_use_response() {
        let resp: AnthropicResponse = serde_json::from_str(
            r#"{
                "id": "msg_02",
                "model": "claude-haiku-4-5-20251001",
                "content": [
                    {"type": "text", "text": "Let me look that up"},
                    {"type": "tool_use", "id": "toolu_abc", "name": "get_orders", "input": {"last_name": "Smith"}}
                ],
                "usage": {"input_tokens": 20, "output_tokens": 10},
                "stop_reason": "tool_use"
            }"#,
        )
        .unwrap();

        let mr = AnthropicProvider::into_model_response(resp);
        assert!(mr.stop_reason.wants_tools());
        let calls = mr.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "toolu_abc");
        assert_eq!(calls[0].input["last_name"], "Smith");
    }

    #[test]
    fn missing_stop_reason_is_final() {
        let resp: AnthropicResponse = serde_json::from_str(
            r#"{
                "id": "msg_03",
                "model": "m",
                "content": [],
                "usage": {"input_tokens": 1, "output_tokens": 1}
            }"#,
        )
        .unwrap();
        let mr = AnthropicProvider::into_model_response(resp);
        assert!(!mr.stop_reason.wants_tools());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let p = provider().with_base_url("http://127.0.0.1:9");
        let err = p.complete(request(vec![ChatMessage::user("hi")])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }
}
