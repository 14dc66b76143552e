//! Line-delimited JSON-RPC 2.0 messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a Value,
}

#[derive(Debug, Serialize)]
pub struct Notification<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: &'a Value,
}

/// Error object carried by a failed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    jsonrpc: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// What a line read from the server turned out to be
#[derive(Debug, PartialEq)]
pub enum Incoming {
    Response {
        id: u64,
        outcome: Result<Value, RpcError>,
    },
    /// Valid JSON we have no use for; the reason is logged
    Ignored(&'static str),
}

/// Encode a message as one line, newline included
pub fn encode_line<T: Serialize>(message: &T) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Classify one stdout line. Only malformed JSON is an error.
pub fn decode_line(line: &str) -> Result<Incoming, serde_json::Error> {
    let raw: RawMessage = serde_json::from_str(line)?;

    if raw.jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
        return Ok(Incoming::Ignored("not a JSON-RPC 2.0 message"));
    }
    if raw.method.is_some() {
        return Ok(Incoming::Ignored("server-initiated request or notification"));
    }
    let Some(id) = raw.id.as_ref().and_then(Value::as_u64) else {
        return Ok(Incoming::Ignored("response without a numeric id"));
    };

    let outcome = match raw.error {
        Some(mut error) => {
            if error.message.is_empty() {
                error.message = "Unknown error".to_string();
            }
            Err(error)
        }
        None => Ok(raw.result.unwrap_or(Value::Null)),
    };
    Ok(Incoming::Response { id, outcome })
}
