//! OpenAI-compatible chat-completions enhancer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AiError;
use crate::models::config::AiConfig;

use super::prompt::{SYSTEM_PROMPT, parse_response};
use super::{AiEnhancer, AiResult, EnhancementRequest, EnhancementResponse};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
    max_tokens: u64,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u64,
}

/// Enhancer backed by an OpenAI-style `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiEnhancer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens_per_call: u64,
    request_timeout_ms: u64,
}

impl OpenAiEnhancer {
    /// Create an enhancer with default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> AiResult<Self> {
        Self::with_config(api_key, &AiConfig::default())
    }

    /// Create an enhancer from configuration, reading the key from the
    /// environment variable the config names.
    pub fn from_config(config: &AiConfig) -> AiResult<Self> {
        let api_key = config.api_key().ok_or_else(|| {
            AiError::Auth(format!("environment variable {} is not set", config.api_key_env))
        })?;
        Self::with_config(api_key, config)
    }

    fn with_config(api_key: impl Into<String>, config: &AiConfig) -> AiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| AiError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
            max_tokens_per_call: config.max_tokens_per_call,
            request_timeout_ms: config.request_timeout_ms,
        })
    }

    /// Use another base URL (for proxies and compatible servers).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }

    fn map_transport_error(&self, error: reqwest::Error) -> AiError {
        if error.is_timeout() {
            AiError::Timeout(self.request_timeout_ms)
        } else {
            AiError::Http(error.to_string())
        }
    }
}

#[async_trait]
impl AiEnhancer for OpenAiEnhancer {
    async fn enhance(&self, request: &EnhancementRequest) -> AiResult<EnhancementResponse> {
        let max_tokens = request.budget_remaining.min(self.max_tokens_per_call);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            max_tokens,
            temperature: 0.0,
        };

        info!(
            model = %self.model,
            prompt_length = request.prompt.len(),
            candidates = request.candidates.len(),
            max_tokens,
            "Calling AI enhancement"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AiError::Auth(format!("endpoint returned {status}")));
        }
        if !status.is_success() {
            return Err(AiError::Http(format!("endpoint returned {status}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let chat: ChatResponse =
            serde_json::from_str(&text).map_err(|e| AiError::Malformed(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AiError::Malformed("response has no message content".to_string()))?;

        let contacts = parse_response(&content)?;
        let tokens_used = chat.usage.map(|u| u.total_tokens).unwrap_or(max_tokens);

        debug!(
            contacts = contacts.len(),
            tokens_used, "AI enhancement response parsed"
        );

        Ok(EnhancementResponse {
            contacts,
            tokens_used,
        })
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: "hi",
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            max_tokens: 500,
            temperature: 0.0,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["max_tokens"], 500);
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{\"contacts\": []}"}}],
            "usage": {"prompt_tokens": 90, "completion_tokens": 10, "total_tokens": 100}
        }"#;
        let chat: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(chat.usage.unwrap().total_tokens, 100);
        assert_eq!(chat.choices[0].message.content.as_deref(), Some("{\"contacts\": []}"));
    }

    #[test]
    fn test_endpoint_is_normalized() {
        let enhancer = OpenAiEnhancer::new("key")
            .unwrap()
            .with_endpoint("http://localhost:8080/v1/");
        assert_eq!(enhancer.completions_url(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_missing_key_is_auth_error() {
        let config = AiConfig {
            api_key_env: "CALLSHEET_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..AiConfig::default()
        };
        assert!(matches!(
            OpenAiEnhancer::from_config(&config),
            Err(AiError::Auth(_))
        ));
    }
}
