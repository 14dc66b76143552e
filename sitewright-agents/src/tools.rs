//! The closed set of tools the conversation model may call.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitewright_llm_sdk::error::LlmError;
use sitewright_llm_sdk::tools::{Tool, ToolCall};
use sitewright_tools::{BackendFramework, BridgeError, FrontendFramework, ToolServer};

pub const RESEARCH_BEST_PRACTICES: &str = "research_best_practices";
pub const GENERATE_PRD: &str = "generate_prd";
pub const GENERATE_USER_STORIES: &str = "generate_user_stories";
pub const GENERATE_TASK_LIST: &str = "generate_task_list";
pub const GENERATE_WEBSITE_CODE: &str = "generate_website_code";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResearchArgs {
    #[schemars(
        description = "The research query, e.g., \"best practices for building a blog platform with React\""
    )]
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePrdArgs {
    #[schemars(description = "Detailed description of the product to build")]
    pub product_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateUserStoriesArgs {
    #[schemars(description = "The PRD content to generate user stories from")]
    pub prd_content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTaskListArgs {
    #[schemars(description = "The user stories content to generate tasks from")]
    pub user_stories_content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateWebsiteCodeArgs {
    #[schemars(description = "Complete description of the website to generate")]
    pub product_description: String,
    #[schemars(description = "Frontend framework to use")]
    pub frontend: FrontendFramework,
    #[schemars(description = "Backend technology to use")]
    pub backend: BackendFramework,
}

/// A parsed tool call
#[derive(Debug, Clone, PartialEq)]
pub enum SiteTool {
    ResearchBestPractices(ResearchArgs),
    GeneratePrd(GeneratePrdArgs),
    GenerateUserStories(GenerateUserStoriesArgs),
    GenerateTaskList(GenerateTaskListArgs),
    GenerateWebsiteCode(GenerateWebsiteCodeArgs),
    Unsupported { name: String },
}

impl SiteTool {
    /// Parse a model tool call. Unknown names become `Unsupported`; bad
    /// arguments for a known name are an error.
    pub fn parse(call: &ToolCall) -> Result<Self, LlmError> {
        let tool = match call.name() {
            RESEARCH_BEST_PRACTICES => SiteTool::ResearchBestPractices(call.parse_arguments()?),
            GENERATE_PRD => SiteTool::GeneratePrd(call.parse_arguments()?),
            GENERATE_USER_STORIES => SiteTool::GenerateUserStories(call.parse_arguments()?),
            GENERATE_TASK_LIST => SiteTool::GenerateTaskList(call.parse_arguments()?),
            GENERATE_WEBSITE_CODE => SiteTool::GenerateWebsiteCode(call.parse_arguments()?),
            other => SiteTool::Unsupported {
                name: other.to_string(),
            },
        };
        Ok(tool)
    }

    pub fn name(&self) -> &str {
        match self {
            SiteTool::ResearchBestPractices(_) => RESEARCH_BEST_PRACTICES,
            SiteTool::GeneratePrd(_) => GENERATE_PRD,
            SiteTool::GenerateUserStories(_) => GENERATE_USER_STORIES,
            SiteTool::GenerateTaskList(_) => GENERATE_TASK_LIST,
            SiteTool::GenerateWebsiteCode(_) => GENERATE_WEBSITE_CODE,
            SiteTool::Unsupported { name } => name,
        }
    }

    /// Run the matching pipeline step on the tool server
    pub async fn dispatch(&self, server: &dyn ToolServer) -> Result<Value, ToolFailure> {
        let result = match self {
            SiteTool::ResearchBestPractices(args) => server.research(&args.query).await,
            SiteTool::GeneratePrd(args) => server.generate_prd(&args.product_description).await,
            SiteTool::GenerateUserStories(args) => {
                server.generate_user_stories(&args.prd_content).await
            }
            SiteTool::GenerateTaskList(args) => {
                server.generate_task_list(&args.user_stories_content).await
            }
            SiteTool::GenerateWebsiteCode(args) => {
                server
                    .generate_starter_kit(&args.product_description, args.frontend, args.backend)
                    .await
            }
            SiteTool::Unsupported { name } => {
                return Err(ToolFailure::UnknownTool { name: name.clone() })
            }
        };
        result.map_err(ToolFailure::from)
    }
}

/// Why a tool call produced an error result instead of output
#[derive(Debug, thiserror::Error)]
pub enum ToolFailure {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error(transparent)]
    InvalidArguments(#[from] LlmError),

    #[error(transparent)]
    Server(#[from] BridgeError),
}

/// Schemas advertised to the model on every request
pub fn tool_definitions() -> Vec<Tool> {
    vec![
        Tool::from_type::<ResearchArgs>()
            .name(RESEARCH_BEST_PRACTICES)
            .description("Research best practices, latest trends, and technologies for a given topic or project type. Use this when user asks about technologies, frameworks, or needs recommendations.")
            .build(),
        Tool::from_type::<GeneratePrdArgs>()
            .name(GENERATE_PRD)
            .description("Generate a comprehensive Product Requirements Document (PRD) for a software project. Use this when you have a clear understanding of what the user wants to build.")
            .build(),
        Tool::from_type::<GenerateUserStoriesArgs>()
            .name(GENERATE_USER_STORIES)
            .description("Generate detailed user stories with acceptance criteria from a PRD. Use this after creating a PRD to break it down into user-focused features.")
            .build(),
        Tool::from_type::<GenerateTaskListArgs>()
            .name(GENERATE_TASK_LIST)
            .description("Generate a detailed development task list from user stories. Use this to break down user stories into actionable development tasks.")
            .build(),
        Tool::from_type::<GenerateWebsiteCodeArgs>()
            .name(GENERATE_WEBSITE_CODE)
            .description("Generate complete full-stack website code (frontend + backend). Use this as the final step after planning is complete.")
            .build(),
    ]
}
