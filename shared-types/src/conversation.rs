use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Body accepted by both chat endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// Returns the message when it carries any non-whitespace text
    pub fn non_empty_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChatData {
    pub message: Option<String>,
    pub session_id: String,
    pub conversation_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChatResponse {
    pub success: bool,
    pub data: ChatData,
}

impl ChatResponse {
    pub fn new(data: ChatData) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Function name and raw JSON argument string of a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FunctionCallInfo {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ToolCallInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCallInfo,
}

/// A conversation entry as exposed to the browser client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConversationMessage {
    pub role: String,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HistoryData {
    pub session_id: String,
    pub messages: Vec<ConversationMessage>,
    pub message_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HistoryResponse {
    pub success: bool,
    pub data: HistoryData,
}

impl HistoryResponse {
    pub fn new(data: HistoryData) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClearHistoryResponse {
    pub success: bool,
    pub message: String,
}

impl Default for ClearHistoryResponse {
    fn default() -> Self {
        Self {
            success: true,
            message: "Conversation history cleared".to_string(),
        }
    }
}

/// One Server-Sent-Events frame of the streaming chat endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum StreamEvent {
    Content { content: String },
    ToolCall { tools: Vec<ToolCallInfo> },
    Done,
    Error { error: String },
}

impl StreamEvent {
    /// Encodes the event as a complete `data: ...` frame including the blank line terminator
    pub fn to_sse_frame(&self) -> Result<String, serde_json::Error> {
        let payload = serde_json::to_string(self)?;
        Ok(format!("data: {}\n\n", payload))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error { .. })
    }
}
