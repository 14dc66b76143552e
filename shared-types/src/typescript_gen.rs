pub fn generate_typescript_definitions(
    type_names: &[&str],
) -> Result<String, Box<dyn std::error::Error>> {
    if type_names.is_empty() {
        return Err("No type names provided".into());
    }

    let mut definitions = Vec::new();

    for name in type_names {
        let type_def = export_type(name)?;
        let cleaned = clean_type(type_def);

        if !cleaned.trim().is_empty() {
            definitions.push(cleaned);
        }
    }

    Ok(definitions.join("\n\n"))
}

/// Every exported type, in dependency order
pub const ALL_TYPE_NAMES: &[&str] = &[
    "ChatRequest",
    "ChatData",
    "ChatResponse",
    "FunctionCallInfo",
    "ToolCallInfo",
    "ConversationMessage",
    "HistoryData",
    "HistoryResponse",
    "ClearHistoryResponse",
    "StreamEvent",
    "HealthResponse",
    "EndpointInfo",
    "ServiceInfo",
    "ErrorResponse",
];

fn export_type(name: &str) -> Result<String, Box<dyn std::error::Error>> {
    use crate::*;

    let result = match name {
        "ChatRequest" => ChatRequest::export_to_string()?,
        "ChatData" => ChatData::export_to_string()?,
        "ChatResponse" => ChatResponse::export_to_string()?,
        "FunctionCallInfo" => FunctionCallInfo::export_to_string()?,
        "ToolCallInfo" => ToolCallInfo::export_to_string()?,
        "ConversationMessage" => ConversationMessage::export_to_string()?,
        "HistoryData" => HistoryData::export_to_string()?,
        "HistoryResponse" => HistoryResponse::export_to_string()?,
        "ClearHistoryResponse" => ClearHistoryResponse::export_to_string()?,
        "StreamEvent" => StreamEvent::export_to_string()?,

        "HealthResponse" => HealthResponse::export_to_string()?,
        "EndpointInfo" => EndpointInfo::export_to_string()?,
        "ServiceInfo" => ServiceInfo::export_to_string()?,

        "ErrorResponse" => ErrorResponse::export_to_string()?,

        _ => {
            return Err(format!(
                "Unknown type: '{}'. Available types can be found in shared-types/src/",
                name
            )
            .into());
        }
    };

    Ok(result)
}

pub(crate) fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    let lines: Vec<&str> = type_def.lines().collect();

    let filtered: Vec<&str> = lines
        .iter()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
        })
        .cloned()
        .collect();

    filtered.join("\n").trim().to_string()
}
