use sitewright_tools::{BridgeConfig, McpBridge};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Create the tool-server bridge and try to start it.
///
/// The service keeps running without tools when the credential is missing or
/// the server fails to start; `/health` reports it as not ready.
pub async fn start_bridge(config: BridgeConfig) -> Arc<McpBridge> {
    let has_key = config.api_key().is_some();
    let bridge = Arc::new(McpBridge::new(config));

    if !has_key {
        warn!("No OPENROUTER_API_KEY; MCP tool server not started");
        return bridge;
    }

    match bridge.start().await {
        Ok(()) => info!("MCP tool server started"),
        Err(e) => error!(error = %e, "Failed to start MCP tool server; running without tools"),
    }
    bridge
}
