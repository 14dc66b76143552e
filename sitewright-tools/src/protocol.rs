//! Typed MCP payloads for the handshake and tool calls.

use rust_mcp_schema::{
    CallToolRequestParams, ClientCapabilities, Implementation, InitializeRequestParams,
    ListToolsResult,
};
use serde_json::Value;

use crate::config::{BridgeConfig, PROTOCOL_VERSION};
use crate::error::BridgeError;

pub fn initialize_params(config: &BridgeConfig) -> InitializeRequestParams {
    InitializeRequestParams {
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: config.client_name.clone(),
            version: config.client_version.clone(),
            title: None,
            description: None,
            icons: Vec::new(),
            website_url: None,
        },
        meta: None,
        protocol_version: PROTOCOL_VERSION.to_string(),
    }
}

/// `tools/call` params. `null` arguments are sent as none at all.
pub fn call_tool_params(name: &str, arguments: Value) -> Result<CallToolRequestParams, BridgeError> {
    let params = CallToolRequestParams::new(name);
    match arguments {
        Value::Object(map) => Ok(params.with_arguments(map)),
        Value::Null => Ok(params),
        _ => Err(BridgeError::InvalidArguments {
            tool: name.to_string(),
        }),
    }
}

/// Names advertised in a `tools/list` result
pub fn tool_names(listing: Value) -> Result<Vec<String>, BridgeError> {
    let listing: ListToolsResult = serde_json::from_value(listing)?;
    Ok(listing.tools.into_iter().map(|tool| tool.name).collect())
}
