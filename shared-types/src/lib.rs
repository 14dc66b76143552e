use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod conversation;
pub mod health;
pub mod typescript_gen;

pub use typescript_gen::generate_typescript_definitions;

pub use conversation::{
    ChatData, ChatRequest, ChatResponse, ClearHistoryResponse, ConversationMessage,
    FunctionCallInfo, HistoryData, HistoryResponse, StreamEvent, ToolCallInfo,
};
pub use health::{EndpointInfo, HealthResponse, ServiceInfo};

// Wire types shared between sitewright-api and the browser client

/// Error envelope returned by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}
