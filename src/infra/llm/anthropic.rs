use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::domain::{CompletionRequest, LlmError, ProviderKind};

use super::CompletionClient;
use super::env::{read_api_key, read_env_var, read_provider_timeout};
use super::response_parsing::{build_v1_url, truncate_message};

const API_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ENV_BASE_URL: &str = "CAREERKIT_ANTHROPIC_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "CAREERKIT_ANTHROPIC_TIMEOUT_SECS";

pub struct AnthropicClient {
    api_key: String,
    api_base_url: String,
    client: Client,
}

impl AnthropicClient {
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = read_api_key(ProviderKind::Anthropic)?;
        let api_base_url = read_env_var(ENV_BASE_URL)?.unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let timeout = read_provider_timeout(ENV_TIMEOUT_SECS)?;
        Self::with_config(api_key, api_base_url, timeout)
    }

    pub fn with_config(
        api_key: impl Into<String>,
        api_base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::validation("Anthropic API key must not be empty"));
        }

        let api_base_url = api_base_url.into();
        if api_base_url.trim().is_empty() {
            return Err(LlmError::validation(
                "Anthropic API base URL must not be empty",
            ));
        }

        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            LlmError::internal(format!("failed to create Anthropic HTTP client: {err}"))
        })?;

        Ok(Self {
            api_key: api_key.trim().to_string(),
            api_base_url,
            client,
        })
    }

    fn endpoint_url(&self) -> String {
        build_v1_url(&self.api_base_url, "messages")
    }

    fn build_request_payload(request: &CompletionRequest) -> AnthropicMessagesRequest<'_> {
        AnthropicMessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![AnthropicMessage {
                role: "user",
                content: &request.prompt,
            }],
        }
    }

    fn map_success_response(response_body: &str) -> Result<String, LlmError> {
        let response: AnthropicMessagesResponse =
            serde_json::from_str(response_body).map_err(|err| {
                LlmError::invalid_response(format!("Anthropic response decode failed: {err}"))
            })?;

        response
            .content
            .iter()
            .find_map(AnthropicContentBlock::as_text)
            .filter(|text| !text.trim().is_empty())
            .map(str::to_owned)
            .ok_or_else(|| {
                LlmError::invalid_response(
                    "Anthropic response did not include a text content block",
                )
            })
    }
}

impl CompletionClient for AnthropicClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        request.validate()?;
        let payload = Self::build_request_payload(request);

        let response = self
            .client
            .post(self.endpoint_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&payload)
            .send()
            .map_err(map_transport_error)?;

        let status = response.status();
        let response_body = response.text().map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_http_error(status, &response_body));
        }

        Self::map_success_response(&response_body)
    }
}

#[derive(Debug, Serialize)]
struct AnthropicMessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicMessagesResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl AnthropicContentBlock {
    fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Other => None,
        }
    }
}

fn map_http_error(status: StatusCode, body: &str) -> LlmError {
    let parsed_error = serde_json::from_str::<AnthropicErrorEnvelope>(body).ok();
    let error_type = parsed_error
        .as_ref()
        .and_then(|envelope| envelope.error.as_ref())
        .map(|detail| detail.error_type.as_str());

    if matches!(
        error_type,
        Some("authentication_error" | "permission_error")
    ) || status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
    {
        return LlmError::Auth;
    }
    if matches!(error_type, Some("rate_limit_error")) || status == StatusCode::TOO_MANY_REQUESTS {
        return LlmError::RateLimited;
    }
    if matches!(error_type, Some("timeout_error"))
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::GATEWAY_TIMEOUT
    {
        return LlmError::Timeout;
    }

    let message = parsed_error
        .as_ref()
        .and_then(|envelope| envelope.error.as_ref())
        .map(|detail| detail.message.clone())
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| truncate_message(body));
    LlmError::transport(format!("Anthropic API returned HTTP {status}: {message}"))
}

fn map_transport_error(error: reqwest::Error) -> LlmError {
    if error.is_timeout() {
        return LlmError::Timeout;
    }
    LlmError::transport(format!("Anthropic transport error: {error}"))
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorEnvelope {
    #[serde(default)]
    error: Option<AnthropicErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    #[serde(default)]
    message: String,
}
