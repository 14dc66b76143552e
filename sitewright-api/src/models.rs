//! Conversions from orchestrator types to the wire types in `shared-types`.

use shared_types::{ConversationMessage, FunctionCallInfo, StreamEvent, ToolCallInfo};
use sitewright_agents::TurnEvent;
use sitewright_llm_sdk::tools::ToolCall;
use sitewright_llm_sdk::types::{ChatMessage, Role};
use tracing::debug;

pub fn tool_call_info(call: &ToolCall) -> ToolCallInfo {
    ToolCallInfo {
        id: call.id.clone(),
        kind: call.kind.clone(),
        function: FunctionCallInfo {
            name: call.function.name.clone(),
            arguments: call.function.arguments.clone(),
        },
    }
}

pub fn conversation_message(message: &ChatMessage) -> ConversationMessage {
    ConversationMessage {
        role: message.role.to_string(),
        content: message.content.clone(),
        tool_calls: message
            .tool_calls
            .as_ref()
            .map(|calls| calls.iter().map(tool_call_info).collect()),
        tool_call_id: message.tool_call_id.clone(),
    }
}

/// History as shown to clients: everything except the system prompt
pub fn visible_messages(history: &[ChatMessage]) -> Vec<ConversationMessage> {
    history
        .iter()
        .filter(|message| message.role != Role::System)
        .map(conversation_message)
        .collect()
}

/// SSE frame for a turn event. Tool outcomes stay server-side.
pub fn stream_event(event: TurnEvent) -> Option<StreamEvent> {
    match event {
        TurnEvent::Content(content) => Some(StreamEvent::Content { content }),
        TurnEvent::ToolCalls(calls) => Some(StreamEvent::ToolCall {
            tools: calls.iter().map(tool_call_info).collect(),
        }),
        TurnEvent::ToolResult {
            tool_call_id,
            name,
            success,
        } => {
            debug!(
                tool_call_id = %tool_call_id,
                tool_name = %name,
                success,
                "Tool result not streamed"
            );
            None
        }
    }
}
