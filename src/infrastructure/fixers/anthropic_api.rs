//! Anthropic API fixer
//!
//! Calls the Messages API directly over HTTP. Requires an API key (from
//! config or `ANTHROPIC_API_KEY`). Each proposal is a single request; failed
//! requests are not retried here.

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::prompt::build_fix_prompt;
use crate::domain::models::FixerConfig;
use crate::domain::ports::{ExternalFixer, FixRequest, FixerError};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic API fixer
#[derive(Debug, Clone)]
pub struct AnthropicApiConfig {
    /// API key (required)
    pub api_key: String,

    /// Model to use
    pub model: String,

    /// Base URL for API (for testing/proxies)
    pub base_url: String,

    /// Maximum tokens generated per proposal
    pub max_tokens: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl AnthropicApiConfig {
    /// Build from fixer settings; fails when no API key can be found.
    pub fn from_fixer_config(config: &FixerConfig) -> Result<Self, FixerError> {
        let api_key = config.resolved_api_key().ok_or_else(|| {
            FixerError::NotConfigured(
                "Anthropic API key missing (set fixer.api_key or ANTHROPIC_API_KEY)".to_string(),
            )
        })?;
        Ok(Self {
            api_key,
            model: config.model.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_tokens: config.max_tokens,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// Fixer backed by the Anthropic Messages API.
pub struct AnthropicApiFixer {
    http_client: ReqwestClient,
    config: AnthropicApiConfig,
}

impl AnthropicApiFixer {
    pub fn new(config: AnthropicApiConfig) -> Result<Self, FixerError> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| FixerError::NotConfigured(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn error_for_status(status: StatusCode, body: String) -> FixerError {
        warn!("API error ({}): {}", status, body);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FixerError::Auth(body),
            StatusCode::TOO_MANY_REQUESTS => FixerError::Unavailable(format!("rate limited: {body}")),
            status if status.is_server_error() => {
                FixerError::Unavailable(format!("server error {status}: {body}"))
            }
            status => FixerError::ExecutionFailed(format!("HTTP {status}: {body}")),
        }
    }
}

#[async_trait]
impl ExternalFixer for AnthropicApiFixer {
    fn fixer_id(&self) -> &str {
        "anthropic-api"
    }

    #[instrument(skip(self, request), fields(model = %self.config.model, attempt = request.attempt_number))]
    async fn propose_fix(&self, request: &FixRequest) -> Result<String, FixerError> {
        let prompt = build_fix_prompt(request);
        let body = MessageRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![Message {
                role: "user",
                content: &prompt,
            }],
        };

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.config.base_url.trim_end_matches('/')))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FixerError::Timeout(self.config.timeout_secs)
                } else {
                    FixerError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        debug!("Response status: {}", status);
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::error_for_status(status, body));
        }

        let message: MessageResponse = response
            .json()
            .await
            .map_err(|e| FixerError::InvalidResponse(e.to_string()))?;

        let text: String = message
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();

        Ok(text)
    }
}
