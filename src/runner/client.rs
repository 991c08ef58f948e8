//! @ai:module:intent OpenAI-compatible chat-completion client used by the judge
//! @ai:module:layer infrastructure
//! @ai:module:public_api ChatClient, ChatClientTrait, ChatResponse, ClientError, MockChatClient
//! @ai:module:stateless false

use crate::config::ApiConfig;
use crate::runner::rate_limiter::RateLimiter;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// @ai:intent Failures talking to the chat endpoint
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0} not set in environment")]
    MissingApiKey(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("chat API error ({status}): {body}")]
    Status { status: StatusCode, body: String },

    #[error("chat API returned no content")]
    EmptyResponse,
}

impl ClientError {
    /// @ai:intent Whether repeating the same request may succeed
    /// @ai:effects pure
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Timeout => true,
            ClientError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ClientError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            ClientError::MissingApiKey(_) | ClientError::EmptyResponse => false,
        }
    }
}

/// @ai:intent Trait for a chat-completion backend
#[allow(async_fn_in_trait)]
pub trait ChatClientTrait: Send + Sync {
    /// @ai:intent Send a system + user prompt and return the assistant reply
    async fn complete(&self, system: &str, prompt: &str) -> Result<ChatResponse, ClientError>;
}

/// @ai:intent Reply from the chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
    response_format: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// JSON schema of the verdict the judge must return.
fn verdict_format() -> serde_json::Value {
    serde_json::json!({
        "type": "json_schema",
        "json_schema": {
            "name": "story_verdict",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "explanation": { "type": "string" },
                    "final_output": { "type": "array", "items": { "type": "integer" } }
                },
                "required": ["explanation", "final_output"],
                "additionalProperties": false
            }
        }
    })
}

/// @ai:intent Chat client with rate limiting and a per-request timeout
pub struct ChatClient {
    client: reqwest::Client,
    config: ApiConfig,
    rate_limiter: Arc<RateLimiter>,
    api_key: String,
}

impl ChatClient {
    /// @ai:intent Create a client, reading the API key from the configured variable
    /// @ai:pre the environment variable named by config.api_key_env is set
    /// @ai:effects env
    pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ClientError::MissingApiKey(config.api_key_env.clone()))?;

        let rate_limiter = Arc::new(RateLimiter::new(config.requests_per_minute));
        Self::with_rate_limiter(config, api_key, rate_limiter)
    }

    /// @ai:intent Create a client with an explicit key and shared rate limiter
    /// @ai:effects pure
    pub fn with_rate_limiter(
        config: ApiConfig,
        api_key: String,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            config,
            rate_limiter,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

impl ChatClientTrait for ChatClient {
    /// @ai:effects network
    async fn complete(&self, system: &str, prompt: &str) -> Result<ChatResponse, ClientError> {
        self.rate_limiter.acquire().await;

        let request = ApiRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
            response_format: verdict_format(),
        };

        tracing::debug!(model = %self.config.model, "judge chat request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { ClientError::Timeout } else { ClientError::Http(e) })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        let api_response: ApiResponse = response.json().await?;
        let usage = api_response.usage;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ClientError::EmptyResponse)?;

        Ok(ChatResponse {
            content,
            prompt_tokens: usage.as_ref().map(|u| u.prompt_tokens).unwrap_or(0),
            completion_tokens: usage.as_ref().map(|u| u.completion_tokens).unwrap_or(0),
        })
    }
}

/// @ai:intent Mock client returning a fixed reply, used for dry runs and tests
pub struct MockChatClient {
    response: String,
}

impl MockChatClient {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl ChatClientTrait for MockChatClient {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<ChatResponse, ClientError> {
        Ok(ChatResponse {
            content: self.response.clone(),
            prompt_tokens: 0,
            completion_tokens: 0,
        })
    }
}

/// Client that fails every request, counting attempts.
#[cfg(test)]
pub(crate) struct FailingChatClient {
    status: Option<StatusCode>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl FailingChatClient {
    /// Every request times out.
    pub(crate) fn timing_out() -> Self {
        Self {
            status: None,
            calls: Default::default(),
        }
    }

    /// Every request is answered with `status`.
    pub(crate) fn with_status(status: StatusCode) -> Self {
        Self {
            status: Some(status),
            calls: Default::default(),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl ChatClientTrait for FailingChatClient {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<ChatResponse, ClientError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        Err(match self.status {
            Some(status) => ClientError::Status {
                status,
                body: "denied".to_string(),
            },
            None => ClientError::Timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client() {
        let client = MockChatClient::new(r#"{"explanation": "ok", "final_output": [7, 7, 7, 7]}"#);
        let response = client.complete("system", "story").await.unwrap();
        assert!(response.content.contains("final_output"));
    }

    #[test]
    fn test_retryable_statuses() {
        let throttled = ClientError::Status {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: String::new(),
        };
        let unavailable = ClientError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: String::new(),
        };
        let unauthorized = ClientError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: String::new(),
        };

        assert!(throttled.is_retryable());
        assert!(unavailable.is_retryable());
        assert!(!unauthorized.is_retryable());
        assert!(ClientError::Timeout.is_retryable());
        assert!(!ClientError::EmptyResponse.is_retryable());
    }

    #[test]
    fn test_missing_api_key() {
        let config = ApiConfig {
            api_key_env: "STORY_BENCH_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        let err = ChatClient::new(config).err().unwrap();
        assert!(matches!(err, ClientError::MissingApiKey(_)));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:1234/v1/".to_string(),
            ..Default::default()
        };
        let client =
            ChatClient::with_rate_limiter(config, "key".to_string(), Arc::new(RateLimiter::new(60)))
                .unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:1234/v1/chat/completions");
    }
}
