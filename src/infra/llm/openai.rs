use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{CompletionRequest, LlmError, ProviderKind};

use super::CompletionClient;
use super::env::{read_api_key, read_env_var, read_provider_timeout};
use super::response_parsing::{build_v1_url, non_blank_owned, truncate_message};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const ENV_BASE_URL: &str = "CAREERKIT_OPENAI_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "CAREERKIT_OPENAI_TIMEOUT_SECS";

pub struct OpenAiClient {
    api_key: String,
    api_base_url: String,
    client: Client,
}

impl OpenAiClient {
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = read_api_key(ProviderKind::OpenAi)?;
        let api_base_url =
            read_env_var(ENV_BASE_URL)?.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
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
            return Err(LlmError::validation("OpenAI API key must not be empty"));
        }

        let api_base_url = api_base_url.into();
        if api_base_url.trim().is_empty() {
            return Err(LlmError::validation("OpenAI API base URL must not be empty"));
        }

        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            LlmError::internal(format!("failed to create OpenAI HTTP client: {err}"))
        })?;

        Ok(Self {
            api_key: api_key.trim().to_string(),
            api_base_url,
            client,
        })
    }

    fn endpoint_url(&self) -> String {
        build_v1_url(&self.api_base_url, "chat/completions")
    }

    fn build_request_payload(request: &CompletionRequest) -> OpenAiChatCompletionsRequest<'_> {
        OpenAiChatCompletionsRequest {
            model: &request.model,
            messages: vec![OpenAiChatMessageRequest {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    fn map_success_response(response_body: &str) -> Result<String, LlmError> {
        let response: OpenAiChatCompletionsResponse = serde_json::from_str(response_body)
            .map_err(|err| {
                LlmError::invalid_response(format!("OpenAI response decode failed: {err}"))
            })?;

        response
            .choices
            .first()
            .and_then(OpenAiChoice::extract_text)
            .ok_or_else(|| LlmError::invalid_response("OpenAI response did not include text content"))
    }
}

impl CompletionClient for OpenAiClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        request.validate()?;
        let payload = Self::build_request_payload(request);

        let response = self
            .client
            .post(self.endpoint_url())
            .bearer_auth(&self.api_key)
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
struct OpenAiChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiChatMessageRequest<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct OpenAiChatMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    #[serde(default)]
    message: Option<OpenAiChoiceMessage>,
    #[serde(default)]
    text: Option<String>,
}

impl OpenAiChoice {
    fn extract_text(&self) -> Option<String> {
        if let Some(text) = self.text.as_deref().and_then(non_blank_owned) {
            return Some(text);
        }

        let content = self.message.as_ref()?.content.as_ref()?;
        extract_message_content(content)
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorEnvelope {
    #[serde(default)]
    error: Option<OpenAiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

fn extract_message_content(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => non_blank_owned(text),
        Value::Array(parts) => {
            let joined = parts
                .iter()
                .filter_map(extract_content_part_text)
                .collect::<String>();
            non_blank_owned(&joined)
        }
        _ => None,
    }
}

fn extract_content_part_text(part: &Value) -> Option<String> {
    match part {
        Value::String(text) => Some(text.to_string()),
        Value::Object(map) => map
            .get("text")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned),
        _ => None,
    }
}

fn map_http_error(status: StatusCode, body: &str) -> LlmError {
    let parsed_error = serde_json::from_str::<OpenAiErrorEnvelope>(body).ok();
    let detail = parsed_error
        .as_ref()
        .and_then(|envelope| envelope.error.as_ref());
    let error_type = detail.and_then(|detail| detail.error_type.as_deref());
    let error_code = detail.and_then(|detail| detail.code.as_deref());

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || matches!(error_type, Some("authentication_error"))
        || matches!(
            error_code,
            Some("invalid_api_key" | "invalid_authentication")
        )
    {
        return LlmError::Auth;
    }

    if status == StatusCode::TOO_MANY_REQUESTS
        || matches!(error_type, Some("rate_limit_error" | "insufficient_quota"))
        || matches!(
            error_code,
            Some("rate_limit_exceeded" | "insufficient_quota")
        )
    {
        return LlmError::RateLimited;
    }

    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::GATEWAY_TIMEOUT
        || matches!(error_type, Some("timeout" | "server_timeout"))
        || matches!(error_code, Some("request_timeout"))
    {
        return LlmError::Timeout;
    }

    let message = detail
        .map(|detail| detail.message.clone())
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| truncate_message(body));

    LlmError::transport(format!("OpenAI API returned HTTP {status}: {message}"))
}

fn map_transport_error(error: reqwest::Error) -> LlmError {
    if error.is_timeout() {
        return LlmError::Timeout;
    }

    LlmError::transport(format!("OpenAI transport error: {error}"))
}
