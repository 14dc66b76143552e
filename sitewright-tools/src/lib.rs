//! Bridge to an MCP tool server speaking line-delimited JSON-RPC 2.0 over stdio.

pub mod bridge;
pub mod config;
pub mod connection;
pub mod error;
pub mod jsonrpc;
pub mod protocol;
pub mod tool_server;
pub mod types;

pub use bridge::McpBridge;
pub use config::{BridgeConfig, ModelConfig, PipelineStage};
pub use connection::RpcConnection;
pub use error::BridgeError;
pub use tool_server::ToolServer;
pub use types::{BackendFramework, FrontendFramework};
