use std::time::Duration;

use careerkit::app::GenerationGateway;
use careerkit::domain::{
    FailureKind, GenerationFailure, GenerationRequest, GenerationTask, LlmError, ProviderKind,
    RequestField,
};
use careerkit::infra::llm::{AnthropicClient, OpenAiClient, ProviderRegistry};
use mockito::{Matcher, Server};
use serde_json::json;

fn advice_request() -> GenerationRequest {
    GenerationRequest::new()
        .with_field(RequestField::Position, "Data Scientist")
        .with_field(
            RequestField::JobDescription,
            "Strong Python skills and deep learning experience.",
        )
        .with_field(RequestField::ResumeContent, "Data Analyst with 2 years of SQL.")
}

fn openai_gateway(base_url: String) -> GenerationGateway {
    let client = OpenAiClient::with_config("test-key", base_url, Duration::from_secs(2))
        .expect("client should build");
    let mut registry = ProviderRegistry::new();
    registry
        .register(client, "gpt-4o-mini")
        .expect("registration should succeed");
    GenerationGateway::new(registry)
}

fn anthropic_gateway(base_url: String) -> GenerationGateway {
    let client = AnthropicClient::with_config("test-key", base_url, Duration::from_secs(2))
        .expect("client should build");
    let mut registry = ProviderRegistry::new();
    registry
        .register(client, "claude-sonnet-4-20250514")
        .expect("registration should succeed");
    GenerationGateway::new(registry)
}

#[test]
fn openai_advice_succeeds_through_http_mock() {
    let mut server = Server::new();
    let response_body = json!({
        "id": "chatcmpl_01",
        "choices": [
            {
                "finish_reason": "stop",
                "message": { "role": "assistant", "content": "Quantify your SQL impact." }
            }
        ]
    })
    .to_string();

    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_header(
            "content-type",
            Matcher::Regex("application/json.*".to_string()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("\"model\"\\s*:\\s*\"gpt-4o-mini\"".to_string()),
            Matcher::Regex("\"max_tokens\"\\s*:\\s*1024".to_string()),
            Matcher::Regex("\"role\"\\s*:\\s*\"user\"".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(response_body)
        .create();

    let result = openai_gateway(server.url()).generate(
        GenerationTask::Advice,
        &advice_request(),
        ProviderKind::OpenAi,
    );

    mock.assert();
    assert_eq!(result.text(), Some("Quantify your SQL impact."));
}

#[test]
fn anthropic_cover_letter_succeeds_through_http_mock() {
    let mut server = Server::new();
    let response_body = json!({
        "id": "msg_01",
        "stop_reason": "end_turn",
        "content": [
            { "type": "text", "text": "Dear TechCorp hiring team," }
        ]
    })
    .to_string();

    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("\"model\"\\s*:\\s*\"claude-sonnet-4-20250514\"".to_string()),
            Matcher::Regex("\"max_tokens\"\\s*:\\s*800".to_string()),
            Matcher::Regex("TechCorp".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(response_body)
        .create();

    let request = advice_request().with_field(RequestField::CompanyName, "TechCorp");
    let result = anthropic_gateway(server.url()).generate(
        GenerationTask::CoverLetter,
        &request,
        ProviderKind::Anthropic,
    );

    mock.assert();
    assert_eq!(result.text(), Some("Dear TechCorp hiring team,"));
}

#[test]
fn reply_whitespace_is_preserved_by_both_adapters() {
    let reply = "  Dear X,\n";
    let mut server = Server::new();
    let openai_mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "choices": [ { "message": { "role": "assistant", "content": reply } } ] })
                .to_string(),
        )
        .create();
    let anthropic_mock = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "content": [ { "type": "text", "text": reply } ] }).to_string())
        .create();

    let openai = openai_gateway(server.url()).generate(
        GenerationTask::Advice,
        &advice_request(),
        ProviderKind::OpenAi,
    );
    let anthropic = anthropic_gateway(server.url()).generate(
        GenerationTask::Advice,
        &advice_request(),
        ProviderKind::Anthropic,
    );

    openai_mock.assert();
    anthropic_mock.assert();
    assert_eq!(openai.text(), Some(reply));
    assert_eq!(anthropic.text(), Some(reply));
}

#[test]
fn anthropic_rate_limit_surfaces_as_provider_error() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/v1/messages")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"type":"rate_limit_error","message":"slow down"}}"#)
        .create();

    let result = anthropic_gateway(server.url()).generate(
        GenerationTask::Advice,
        &advice_request(),
        ProviderKind::Anthropic,
    );

    mock.assert();
    let failure = result.failure().expect("429 should fail the request");
    assert!(matches!(
        failure,
        GenerationFailure::ProviderError {
            provider: ProviderKind::Anthropic,
            source: LlmError::RateLimited,
        }
    ));
}

#[test]
fn openai_invalid_key_surfaces_as_provider_error() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"error":{"type":"invalid_request_error","code":"invalid_api_key","message":"Incorrect API key provided"}}"#,
        )
        .create();

    let result = openai_gateway(server.url()).generate(
        GenerationTask::Advice,
        &advice_request(),
        ProviderKind::OpenAi,
    );

    mock.assert();
    let failure = result.failure().expect("401 should fail the request");
    assert_eq!(failure.kind(), FailureKind::ProviderError);
    assert!(failure.message().contains("OPENAI_API_KEY"));
}

#[test]
fn openai_server_error_message_reaches_the_user() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"type":"server_error","message":"upstream overloaded"}}"#)
        .create();

    let result = openai_gateway(server.url()).generate(
        GenerationTask::Advice,
        &advice_request(),
        ProviderKind::OpenAi,
    );

    mock.assert();
    assert!(result.render().contains("upstream overloaded"));
}

#[test]
fn anthropic_reply_without_text_is_a_provider_error() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"msg_02","content":[]}"#)
        .create();

    let result = anthropic_gateway(server.url()).generate(
        GenerationTask::Advice,
        &advice_request(),
        ProviderKind::Anthropic,
    );

    mock.assert();
    let failure = result.failure().expect("empty content should fail the request");
    assert!(matches!(
        failure,
        GenerationFailure::ProviderError {
            source: LlmError::InvalidResponse { .. },
            ..
        }
    ));
}

#[test]
fn missing_input_never_reaches_the_vendor() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .expect(0)
        .create();

    let request = advice_request().with_field(RequestField::ResumeContent, "  ");
    let result = openai_gateway(server.url()).generate(
        GenerationTask::Advice,
        &request,
        ProviderKind::OpenAi,
    );

    mock.assert();
    assert_eq!(
        result.failure().map(|failure| failure.kind()),
        Some(FailureKind::MissingInput)
    );
}

#[test]
fn unreachable_vendor_is_a_provider_error() {
    // Nothing listens on the discard port in the test environment.
    let result = openai_gateway("http://127.0.0.1:9".to_string()).generate(
        GenerationTask::Advice,
        &advice_request(),
        ProviderKind::OpenAi,
    );

    let failure = result.failure().expect("connection failure should fail the request");
    assert_eq!(failure.kind(), FailureKind::ProviderError);
    assert!(failure.message().contains("Error with OpenAI API"));
}
