use std::sync::Arc;

use futures_util::StreamExt;
use serde_json::json;
use sitewright_llm_sdk::client::{ChunkStream, LlmClient};
use sitewright_llm_sdk::tools::{Tool, ToolCall, ToolChoice, ToolResult};
use sitewright_llm_sdk::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, FINISH_REASON_TOOL_CALLS,
};
use sitewright_tools::ToolServer;
use tracing::{debug, info, warn};

use crate::accumulator::ToolCallAccumulator;
use crate::error::AgentError;
use crate::tools::{tool_definitions, SiteTool};

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 25;

/// Sampling parameters sent with every completion request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            temperature: 0.6,
            max_tokens: 4096,
            top_p: 0.95,
        }
    }
}

/// Progress reported while a streamed turn runs
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    Content(String),
    ToolCalls(Vec<ToolCall>),
    ToolResult {
        tool_call_id: String,
        name: String,
        success: bool,
    },
}

/// Drives a conversation turn: completion, tool execution, resend.
pub struct ConversationAgent {
    client: Arc<dyn LlmClient>,
    tools: Arc<dyn ToolServer>,
    definitions: Vec<Tool>,
    sampling: SamplingSettings,
    max_tool_rounds: usize,
}

impl ConversationAgent {
    pub fn new(client: Arc<dyn LlmClient>, tools: Arc<dyn ToolServer>) -> Self {
        Self {
            client,
            tools,
            definitions: tool_definitions(),
            sampling: SamplingSettings::default(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_sampling(mut self, sampling: SamplingSettings) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    pub fn client(&self) -> &Arc<dyn LlmClient> {
        &self.client
    }

    pub fn tool_server(&self) -> &Arc<dyn ToolServer> {
        &self.tools
    }

    pub fn sampling(&self) -> SamplingSettings {
        self.sampling
    }

    fn build_request(&self, history: &[ChatMessage], stream: bool) -> ChatCompletionRequest {
        let mut request = ChatCompletionRequest::new("", history.to_vec());
        request.tools = Some(self.definitions.clone());
        request.tool_choice = Some(ToolChoice::Auto.to_wire());
        request.temperature = Some(self.sampling.temperature);
        request.max_tokens = Some(self.sampling.max_tokens);
        request.top_p = Some(self.sampling.top_p);
        if stream {
            request.stream = Some(true);
        }
        request
    }

    /// One blocking completion over the full history
    pub async fn chat(&self, history: &[ChatMessage]) -> Result<ChatCompletionResponse, AgentError> {
        debug!(
            messages = history.len(),
            model = %self.client.model_name(),
            "Sending chat completion"
        );
        Ok(self.client.complete(self.build_request(history, false)).await?)
    }

    /// The same request as [`chat`](Self::chat), streamed
    pub async fn stream_chat(&self, history: &[ChatMessage]) -> Result<ChunkStream, AgentError> {
        debug!(
            messages = history.len(),
            model = %self.client.model_name(),
            "Opening chat completion stream"
        );
        Ok(self
            .client
            .stream_complete(self.build_request(history, true))
            .await?)
    }

    /// Append a user message. Blank input leaves the history untouched.
    pub fn push_user_message(history: &mut Vec<ChatMessage>, message: &str) -> Result<(), AgentError> {
        if message.trim().is_empty() {
            return Err(AgentError::EmptyMessage);
        }
        history.push(ChatMessage::user(message));
        Ok(())
    }

    /// Run the tool loop until the model answers without tool calls.
    /// Returns the final assistant message, which is also appended.
    pub async fn run_turn(&self, history: &mut Vec<ChatMessage>) -> Result<ChatMessage, AgentError> {
        let mut rounds = 0;

        loop {
            let response = self.chat(history).await?;
            let message = response
                .first_message()
                .ok_or(AgentError::EmptyResponse)?;

            match response.tool_calls() {
                Some(calls) => {
                    rounds += 1;
                    self.check_round_limit(rounds)?;

                    let calls = calls.to_vec();
                    history.push(ChatMessage::assistant_with_tools(
                        message.content.clone().filter(|c| !c.is_empty()),
                        calls.clone(),
                    ));
                    for call in &calls {
                        let (result, _) = self.execute_tool_call(call).await;
                        history.push(result);
                    }
                }
                None => {
                    let reply = ChatMessage::assistant(message.content.clone().unwrap_or_default());
                    history.push(reply.clone());
                    info!(rounds, "Turn completed");
                    return Ok(reply);
                }
            }
        }
    }

    /// Streaming variant of [`run_turn`](Self::run_turn). Content deltas, tool
    /// calls and tool outcomes are reported to `sink` as they happen.
    pub async fn run_turn_streaming<F>(
        &self,
        history: &mut Vec<ChatMessage>,
        mut sink: F,
    ) -> Result<ChatMessage, AgentError>
    where
        F: FnMut(TurnEvent) + Send,
    {
        let mut rounds = 0;

        loop {
            let mut stream = self.stream_chat(history).await?;
            let mut content = String::new();
            let mut accumulator = ToolCallAccumulator::new();
            let mut finish_reason: Option<String> = None;

            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                let Some(choice) = chunk.first_choice() else {
                    continue;
                };

                if let Some(text) = choice.delta.content.as_deref().filter(|t| !t.is_empty()) {
                    content.push_str(text);
                    sink(TurnEvent::Content(text.to_string()));
                }
                if let Some(deltas) = &choice.delta.tool_calls {
                    accumulator.extend(deltas);
                }
                if let Some(reason) = &choice.finish_reason {
                    finish_reason = Some(reason.clone());
                }
            }

            let calls = accumulator.finish();
            let wants_tools = finish_reason.as_deref() == Some(FINISH_REASON_TOOL_CALLS);

            if wants_tools && !calls.is_empty() {
                rounds += 1;
                self.check_round_limit(rounds)?;

                let content = (!content.is_empty()).then_some(content);
                history.push(ChatMessage::assistant_with_tools(content, calls.clone()));
                sink(TurnEvent::ToolCalls(calls.clone()));

                for call in &calls {
                    let (result, success) = self.execute_tool_call(call).await;
                    history.push(result);
                    sink(TurnEvent::ToolResult {
                        tool_call_id: call.id().to_string(),
                        name: call.name().to_string(),
                        success,
                    });
                }
                continue;
            }

            if wants_tools {
                warn!("Stream finished for tool calls but none were complete");
            }
            let reply = ChatMessage::assistant(content);
            history.push(reply.clone());
            info!(rounds, "Streamed turn completed");
            return Ok(reply);
        }
    }

    /// Append `message`, run a blocking turn, and return the reply text
    pub async fn respond(
        &self,
        history: &mut Vec<ChatMessage>,
        message: &str,
    ) -> Result<String, AgentError> {
        Self::push_user_message(history, message)?;
        let reply = self.run_turn(history).await?;
        Ok(reply.content.unwrap_or_default())
    }

    /// Append `message` and run a streamed turn
    pub async fn respond_streaming<F>(
        &self,
        history: &mut Vec<ChatMessage>,
        message: &str,
        sink: F,
    ) -> Result<String, AgentError>
    where
        F: FnMut(TurnEvent) + Send,
    {
        Self::push_user_message(history, message)?;
        let reply = self.run_turn_streaming(history, sink).await?;
        Ok(reply.content.unwrap_or_default())
    }

    fn check_round_limit(&self, rounds: usize) -> Result<(), AgentError> {
        if rounds > self.max_tool_rounds {
            warn!(limit = self.max_tool_rounds, "Tool round limit exceeded");
            return Err(AgentError::ToolLoopLimit {
                limit: self.max_tool_rounds,
            });
        }
        Ok(())
    }

    /// Execute one call and build its `tool` message. Failures become an
    /// error result so the model can see them.
    async fn execute_tool_call(&self, call: &ToolCall) -> (ChatMessage, bool) {
        info!(tool_name = %call.name(), tool_call_id = %call.id(), "Executing tool");

        let outcome = match SiteTool::parse(call) {
            Ok(tool) => tool.dispatch(self.tools.as_ref()).await,
            Err(e) => Err(e.into()),
        };

        let (result, success) = match outcome {
            Ok(value) => {
                debug!(tool_name = %call.name(), "Tool succeeded");
                (ToolResult::text(call.id(), value.to_string()), true)
            }
            Err(e) => {
                warn!(tool_name = %call.name(), error = %e, "Tool failed");
                let body = json!({ "error": e.to_string(), "success": false });
                (ToolResult::text(call.id(), body.to_string()), false)
            }
        };
        (result.into_message(), success)
    }
}
