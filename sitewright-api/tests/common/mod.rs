#![allow(dead_code)]

use actix_web::{test, web, App};
use serde_json::{json, Value};
use sitewright_agents::{ConversationAgent, InMemorySessionStore};
use sitewright_api::{configure_routes, AppState};
use sitewright_llm_sdk::client::{ChunkStream, LlmClient};
use sitewright_llm_sdk::error::LlmError;
use sitewright_llm_sdk::tools::ToolCall;
use sitewright_llm_sdk::types::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice,
    ChunkChoice, FunctionDelta, MessageDelta, ToolCallDelta, FINISH_REASON_TOOL_CALLS,
};
use sitewright_tools::{BridgeError, ToolServer};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scripted chat-completions client. An exhausted script is an upstream error.
#[derive(Default)]
pub struct MockLlmClient {
    responses: Mutex<VecDeque<ChatCompletionResponse>>,
    streams: Mutex<VecDeque<Vec<Result<ChatCompletionChunk, LlmError>>>>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<ChatCompletionResponse>) -> Self {
        let client = Self::new();
        for response in responses {
            client.push_response(response);
        }
        client
    }

    pub fn push_response(&self, response: ChatCompletionResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_stream(&self, chunks: Vec<ChatCompletionChunk>) {
        self.streams
            .lock()
            .unwrap()
            .push_back(chunks.into_iter().map(Ok).collect());
    }

    pub fn push_failing_stream(&self, chunks: Vec<ChatCompletionChunk>, error: &str) {
        let mut items: Vec<Result<ChatCompletionChunk, LlmError>> =
            chunks.into_iter().map(Ok).collect();
        items.push(Err(LlmError::stream(error)));
        self.streams.lock().unwrap().push_back(items);
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::api_error(502, "Upstream unavailable".to_string()))
    }

    async fn stream_complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChunkStream, LlmError> {
        self.requests.lock().unwrap().push(request);
        let items = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::api_error(502, "Upstream unavailable".to_string()))?;
        Ok(Box::pin(futures_util::stream::iter(items)))
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}

/// Tool server that records calls and answers with a canned MCP result
pub struct MockToolServer {
    pub calls: Mutex<Vec<(String, Value)>>,
    pub ready: bool,
}

impl MockToolServer {
    pub fn new(ready: bool) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            ready,
        }
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ToolServer for MockToolServer {
    async fn execute_tool(&self, name: &str, arguments: Value) -> Result<Value, BridgeError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));
        if !self.ready {
            return Err(BridgeError::NotConnected);
        }
        Ok(json!({
            "content": [{ "type": "text", "text": format!("{} output", name) }]
        }))
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

pub struct TestApp<S> {
    pub app: S,
    pub llm: Arc<MockLlmClient>,
    pub tools: Arc<MockToolServer>,
    pub sessions: Arc<InMemorySessionStore>,
}

/// App wired with mocks. `llm_configured = false` mimics a missing API key.
pub async fn setup_test_app(
    llm_configured: bool,
) -> TestApp<
    impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
> {
    let llm = Arc::new(MockLlmClient::new());
    let tools = Arc::new(MockToolServer::new(true));
    let sessions = Arc::new(InMemorySessionStore::new());

    let agent = llm_configured
        .then(|| Arc::new(ConversationAgent::new(llm.clone(), tools.clone())));
    let state = AppState::new(agent, tools.clone(), sessions.clone());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    TestApp {
        app,
        llm,
        tools,
        sessions,
    }
}

pub fn text_response(text: &str) -> ChatCompletionResponse {
    ChatCompletionResponse {
        id: "chatcmpl-test".to_string(),
        model: "mock-model".to_string(),
        choices: vec![Choice {
            index: 0,
            message: ChatMessage::assistant(text),
            finish_reason: Some("stop".to_string()),
        }],
        usage: None,
    }
}

pub fn tool_call_response(calls: Vec<ToolCall>) -> ChatCompletionResponse {
    ChatCompletionResponse {
        id: "chatcmpl-test".to_string(),
        model: "mock-model".to_string(),
        choices: vec![Choice {
            index: 0,
            message: ChatMessage::assistant_with_tools(None, calls),
            finish_reason: Some(FINISH_REASON_TOOL_CALLS.to_string()),
        }],
        usage: None,
    }
}

pub fn content_chunk(text: &str) -> ChatCompletionChunk {
    ChatCompletionChunk {
        choices: vec![ChunkChoice {
            delta: MessageDelta {
                content: Some(text.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }],
        ..Default::default()
    }
}

pub fn tool_chunk(index: u32, id: Option<&str>, name: Option<&str>, args: &str) -> ChatCompletionChunk {
    ChatCompletionChunk {
        choices: vec![ChunkChoice {
            delta: MessageDelta {
                tool_calls: Some(vec![ToolCallDelta {
                    index,
                    id: id.map(str::to_string),
                    function: Some(FunctionDelta {
                        name: name.map(str::to_string),
                        arguments: Some(args.to_string()),
                    }),
                }]),
                ..Default::default()
            },
            ..Default::default()
        }],
        ..Default::default()
    }
}

pub fn finish_chunk(reason: &str) -> ChatCompletionChunk {
    ChatCompletionChunk {
        choices: vec![ChunkChoice {
            finish_reason: Some(reason.to_string()),
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// Split an SSE body into its JSON payloads
pub fn parse_sse(body: &[u8]) -> Vec<Value> {
    std::str::from_utf8(body)
        .unwrap()
        .split("\n\n")
        .filter_map(|frame| frame.strip_prefix("data: "))
        .map(|payload| serde_json::from_str(payload).unwrap())
        .collect()
}
