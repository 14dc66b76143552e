use thiserror::Error;

/// Errors raised by the tool-server bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// No live connection to the tool server
    #[error("MCP not connected")]
    NotConnected,

    /// No response arrived within the request timeout
    #[error("Request {method} timed out")]
    Timeout { method: String },

    /// The tool server answered with a JSON-RPC error object
    #[error("{message}")]
    Remote { code: i64, message: String },

    /// The tool server exited or closed its stdout while the request was in flight
    #[error("MCP connection closed")]
    ConnectionClosed,

    #[error("MCP I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to encode MCP message: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// The child process could not be started
    #[error("Failed to start MCP server `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Missing credential: {name} is not set")]
    MissingCredential { name: String },

    /// `tools/call` arguments must be a JSON object
    #[error("Arguments for tool {tool} must be a JSON object")]
    InvalidArguments { tool: String },
}

impl BridgeError {
    pub fn timeout<S: Into<String>>(method: S) -> Self {
        Self::Timeout {
            method: method.into(),
        }
    }

    pub fn remote<S: Into<String>>(code: i64, message: S) -> Self {
        Self::Remote {
            code,
            message: message.into(),
        }
    }
}
