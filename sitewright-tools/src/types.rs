use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tool names exposed by the vibe-coder MCP server
pub mod remote {
    pub const RESEARCH_MANAGER: &str = "research-manager";
    pub const PRD_GENERATOR: &str = "prd-generator";
    pub const USER_STORIES_GENERATOR: &str = "user-stories-generator";
    pub const TASK_LIST_GENERATOR: &str = "task-list-generator";
    pub const STARTER_KIT_GENERATOR: &str = "fullstack-starter-kit-generator";
}

/// Frontend framework for generated starter kits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FrontendFramework {
    #[default]
    React,
    Vue,
    Angular,
    Svelte,
}

impl FrontendFramework {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrontendFramework::React => "react",
            FrontendFramework::Vue => "vue",
            FrontendFramework::Angular => "angular",
            FrontendFramework::Svelte => "svelte",
        }
    }
}

impl fmt::Display for FrontendFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend framework for generated starter kits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BackendFramework {
    #[default]
    Nodejs,
    Python,
    Go,
    Java,
}

impl BackendFramework {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendFramework::Nodejs => "nodejs",
            BackendFramework::Python => "python",
            BackendFramework::Go => "go",
            BackendFramework::Java => "java",
        }
    }
}

impl fmt::Display for BackendFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
