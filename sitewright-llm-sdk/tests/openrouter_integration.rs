use futures_util::StreamExt;
use mockito::Matcher;
use serde_json::json;
use sitewright_llm_sdk::{
    client::LlmClient,
    error::LlmError,
    openrouter::OpenRouterClient,
    tools::{Tool, ToolChoice},
    types::{ChatCompletionRequest, ChatMessage, FINISH_REASON_TOOL_CALLS},
};

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[allow(dead_code)]
struct QueryParams {
    query: String,
}

fn client_for(server: &mockito::ServerGuard) -> OpenRouterClient {
    OpenRouterClient::new("test-key")
        .unwrap()
        .with_base_url(server.url())
        .with_model("test/model")
        .with_app_identity("http://localhost:3002", "Sitewright")
}

fn hello_request() -> ChatCompletionRequest {
    ChatCompletionRequest::new(
        "",
        vec![ChatMessage::system("You are helpful."), ChatMessage::user("hello")],
    )
}

#[tokio::test]
async fn test_complete_returns_assistant_message() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_header("x-title", "Sitewright")
        .match_body(Matcher::PartialJson(json!({
            "model": "test/model",
            "messages": [{"role": "system"}, {"role": "user", "content": "hello"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "gen-1",
                "model": "test/model",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Hi there!"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client.complete(hello_request()).await.unwrap();

    mock.assert_async().await;
    let message = response.first_message().unwrap();
    assert_eq!(message.content.as_deref(), Some("Hi there!"));
    assert_eq!(response.usage.unwrap().total_tokens, 13);
}

#[tokio::test]
async fn test_complete_sends_tools_and_parses_tool_calls() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "tool_choice": "auto",
            "tools": [{"type": "function", "function": {"name": "research_best_practices"}}]
        })))
        .with_status(200)
        .with_body(
            json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {"name": "research_best_practices", "arguments": "{\"query\":\"bakery sites\"}"}
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let tool = Tool::from_type::<QueryParams>()
        .name("research_best_practices")
        .description("Research")
        .build();
    let mut request = hello_request();
    request.tools = Some(vec![tool]);
    request.tool_choice = Some(ToolChoice::Auto.to_wire());

    let response = client_for(&server).complete(request).await.unwrap();
    mock.assert_async().await;

    assert_eq!(response.finish_reason(), Some(FINISH_REASON_TOOL_CALLS));
    let calls = response.tool_calls().unwrap();
    let params: QueryParams = calls[0].parse_arguments().unwrap();
    assert_eq!(params.query, "bakery sites");
}

#[tokio::test]
async fn test_error_status_mapping() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body(json!({"error": {"message": "No auth credentials found", "code": 401}}).to_string())
        .create_async()
        .await;

    match client_for(&server).complete(hello_request()).await {
        Err(LlmError::Authentication { message }) => {
            assert_eq!(message, "No auth credentials found")
        }
        other => panic!("Expected authentication error, got: {:?}", other.map(|r| r.id)),
    }
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(429)
        .with_header("retry-after", "12")
        .with_body("slow down")
        .create_async()
        .await;

    match client_for(&server).complete(hello_request()).await {
        Err(LlmError::RateLimit {
            message,
            retry_after,
        }) => {
            assert_eq!(message, "slow down");
            assert_eq!(retry_after, Some(12));
        }
        other => panic!("Expected rate limit error, got: {:?}", other.map(|r| r.id)),
    }
}

#[tokio::test]
async fn test_stream_complete_yields_chunks() {
    let mut server = mockito::Server::new_async().await;
    let body = concat!(
        ": OPENROUTER PROCESSING\n\n",
        "data: {\"id\":\"g\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"Hi\"}}]}\n\n",
        "data: {\"id\":\"g\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\" there!\"},\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
    );
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("accept", "text/event-stream")
        .match_body(Matcher::PartialJson(json!({"stream": true})))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let stream = client_for(&server)
        .stream_complete(hello_request())
        .await
        .unwrap();
    let chunks: Vec<_> = stream.collect().await;
    mock.assert_async().await;

    assert_eq!(chunks.len(), 2);
    let text: String = chunks
        .iter()
        .filter_map(|chunk| chunk.as_ref().ok())
        .filter_map(|chunk| chunk.first_choice()?.delta.content.clone())
        .collect();
    assert_eq!(text, "Hi there!");
    let last = chunks[1].as_ref().unwrap();
    assert_eq!(last.first_choice().unwrap().finish_reason.as_deref(), Some("stop"));
}

#[tokio::test]
async fn test_stream_complete_fails_before_body_on_error_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(502)
        .with_body(json!({"error": {"message": "provider down"}}).to_string())
        .create_async()
        .await;

    let result = client_for(&server).stream_complete(hello_request()).await;
    assert!(matches!(result, Err(LlmError::Api { status: 502, .. })));
}

// Real API test. Run with: OPENROUTER_API_KEY=sk-or-... cargo test --test openrouter_integration -- --ignored
#[tokio::test]
#[ignore]
async fn test_openrouter_real_api_call() {
    let Ok(api_key) = std::env::var("OPENROUTER_API_KEY") else {
        panic!("Skipping integration test - OPENROUTER_API_KEY not set");
    };

    let client = OpenRouterClient::new(api_key).unwrap();
    let mut request = ChatCompletionRequest::new(
        "",
        vec![ChatMessage::user("Say 'Hello, World!' and nothing else.")],
    );
    request.max_tokens = Some(50);

    let response = client.complete(request).await.unwrap();
    let content = response
        .first_message()
        .and_then(|m| m.content.clone())
        .unwrap_or_default();
    assert!(content.to_lowercase().contains("hello"));
}
