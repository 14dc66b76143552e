use schemars::schema::RootSchema;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::marker::PhantomData;

/// A tool that can be called by an LLM
#[derive(Debug, Clone)]
pub struct Tool {
    name: String,
    description: String,
    parameters: RootSchema,
}

impl Tool {
    /// Create a tool from a type that implements JsonSchema
    pub fn from_type<T: schemars::JsonSchema>() -> ToolBuilder<T> {
        ToolBuilder {
            name: None,
            description: None,
            _phantom: PhantomData,
        }
    }

    // Getters
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &RootSchema {
        &self.parameters
    }
}

#[derive(Serialize)]
struct FunctionDefinition<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a RootSchema,
}

#[derive(Serialize)]
struct FunctionTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionDefinition<'a>,
}

// Tools always go over the wire in the chat-completions `function` shape
impl Serialize for Tool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        FunctionTool {
            kind: "function",
            function: FunctionDefinition {
                name: &self.name,
                description: &self.description,
                parameters: &self.parameters,
            },
        }
        .serialize(serializer)
    }
}

/// Builder for type-safe tools
pub struct ToolBuilder<T> {
    name: Option<String>,
    description: Option<String>,
    _phantom: PhantomData<T>,
}

impl<T: schemars::JsonSchema> ToolBuilder<T> {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Finish the tool. Without an explicit name the schema title (the type name) is used.
    pub fn build(self) -> Tool {
        // Inline subschemas: several gateways reject allOf/$ref in tool parameters
        use schemars::gen::SchemaSettings;

        let settings = SchemaSettings::draft07().with(|s| {
            s.inline_subschemas = true;
        });
        let generator = settings.into_generator();
        let schema = generator.into_root_schema_for::<T>();

        let name = self
            .name
            .or_else(|| schema.schema.metadata.as_ref()?.title.clone())
            .unwrap_or_default();

        Tool {
            name,
            description: self.description.unwrap_or_default(),
            parameters: schema,
        }
    }
}

fn function_kind() -> String {
    "function".to_string()
}

/// Function name and JSON-encoded arguments of a tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// A tool call from the LLM. Arguments are kept as the raw JSON string the
/// model produced so the call can be replayed verbatim in later requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Get the raw JSON argument string
    pub fn raw_arguments(&self) -> &str {
        &self.function.arguments
    }

    /// Parse arguments into a JSON value. An empty argument string is an empty object.
    pub fn arguments_value(&self) -> Result<Value, crate::error::LlmError> {
        if self.function.arguments.trim().is_empty() {
            return Ok(json!({}));
        }
        serde_json::from_str(&self.function.arguments).map_err(|e| {
            crate::error::LlmError::ToolArgumentParse {
                tool_name: self.function.name.clone(),
                source: e,
            }
        })
    }

    /// Parse arguments into a strongly-typed struct
    pub fn parse_arguments<T>(&self) -> Result<T, crate::error::LlmError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = self.arguments_value()?;
        serde_json::from_value(value).map_err(|e| crate::error::LlmError::ToolArgumentParse {
            tool_name: self.function.name.clone(),
            source: e,
        })
    }
}

/// Tool execution result to send back to the LLM
#[derive(Debug, Clone)]
pub struct ToolResult {
    tool_call_id: String,
    content: String,
}

impl ToolResult {
    /// Create a tool result from a plain text string
    pub fn text(tool_call_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: text.into(),
        }
    }

    pub fn tool_call_id(&self) -> &str {
        &self.tool_call_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Convert into the `tool` message appended to the conversation
    pub fn into_message(self) -> crate::types::ChatMessage {
        crate::types::ChatMessage::tool_result(self.tool_call_id, self.content)
    }
}

/// Tool choice strategy
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ToolChoice {
    /// Let the model decide whether to use tools
    #[default]
    Auto,
    /// Force the model to use at least one tool
    Required,
    /// Disable tool use
    None,
    /// Force a specific tool by name
    Specific { name: String },
}

impl ToolChoice {
    /// Chat-completions wire representation
    pub fn to_wire(&self) -> Value {
        match self {
            ToolChoice::Auto => json!("auto"),
            ToolChoice::Required => json!("required"),
            ToolChoice::None => json!("none"),
            ToolChoice::Specific { name } => json!({
                "type": "function",
                "function": { "name": name }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, JsonSchema)]
    struct TestParams {
        /// What to search for
        query: String,
        limit: u32,
    }

    #[test]
    fn test_tool_creation() {
        let tool = Tool::from_type::<TestParams>()
            .name("search")
            .description("Search database")
            .build();

        assert_eq!(tool.name(), "search");
        assert_eq!(tool.description(), "Search database");
    }

    #[test]
    fn test_tool_name_defaults_to_type_name() {
        assert_eq!(Tool::from_type::<TestParams>().build().name(), "TestParams");
    }

    #[test]
    fn test_tool_serializes_as_function() {
        let tool = Tool::from_type::<TestParams>()
            .name("search")
            .description("Search database")
            .build();

        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["type"], "function");
        assert_eq!(value["function"]["name"], "search");
        assert_eq!(value["function"]["parameters"]["type"], "object");
        assert_eq!(
            value["function"]["parameters"]["properties"]["query"]["description"],
            "What to search for"
        );
    }

    #[test]
    fn test_tool_call_parsing() {
        let call = ToolCall::new("call_123", "search", r#"{"query":"rust","limit":10}"#);

        let params: TestParams = call.parse_arguments().unwrap();
        assert_eq!(params.query, "rust");
        assert_eq!(params.limit, 10);
    }

    #[test]
    fn test_malformed_arguments_report_tool_name() {
        let call = ToolCall::new("call_1", "search", "{\"query\": ");
        match call.arguments_value() {
            Err(crate::error::LlmError::ToolArgumentParse { tool_name, .. }) => {
                assert_eq!(tool_name, "search")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_tool_call_deserializes_without_type() {
        let call: ToolCall =
            serde_json::from_str(r#"{"id":"c1","function":{"name":"x","arguments":"{}"}}"#)
                .unwrap();
        assert_eq!(call.kind, "function");
        assert_eq!(call.name(), "x");
    }

    #[test]
    fn test_tool_result_creation() {
        let result = ToolResult::text("call_123", "Found 10 results");
        assert_eq!(result.tool_call_id(), "call_123");
        assert_eq!(result.content(), "Found 10 results");

        let message = result.into_message();
        assert_eq!(message.tool_call_id.as_deref(), Some("call_123"));
    }

    #[test]
    fn test_tool_choice_wire_format() {
        assert_eq!(ToolChoice::Auto.to_wire(), json!("auto"));
        assert_eq!(
            ToolChoice::Specific {
                name: "generate_prd".into()
            }
            .to_wire()["function"]["name"],
            "generate_prd"
        );
    }
}
