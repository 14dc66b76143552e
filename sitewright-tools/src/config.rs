use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_STAGE_MODEL: &str = "x-ai/grok-beta:free";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Pipeline stage served by the tool server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Research,
    Prd,
    UserStories,
    TaskList,
    CodeGeneration,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Research => "research",
            PipelineStage::Prd => "prd",
            PipelineStage::UserStories => "user_stories",
            PipelineStage::TaskList => "task_list",
            PipelineStage::CodeGeneration => "code_generation",
        };
        f.write_str(name)
    }
}

/// Model the tool server should use for each pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub research: String,
    pub prd: String,
    pub user_stories: String,
    pub task_list: String,
    pub code_generation: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            research: DEFAULT_STAGE_MODEL.to_string(),
            prd: DEFAULT_STAGE_MODEL.to_string(),
            user_stories: DEFAULT_STAGE_MODEL.to_string(),
            task_list: DEFAULT_STAGE_MODEL.to_string(),
            code_generation: DEFAULT_STAGE_MODEL.to_string(),
        }
    }
}

impl ModelConfig {
    pub fn for_stage(&self, stage: PipelineStage) -> &str {
        match stage {
            PipelineStage::Research => &self.research,
            PipelineStage::Prd => &self.prd,
            PipelineStage::UserStories => &self.user_stories,
            PipelineStage::TaskList => &self.task_list,
            PipelineStage::CodeGeneration => &self.code_generation,
        }
    }
}

/// How to launch and talk to the tool server
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub command: String,
    pub args: Vec<String>,
    /// Extra variables merged into the child environment
    pub env: HashMap<String, String>,
    pub api_key: Option<String>,
    pub project_root: PathBuf,
    pub output_dir: PathBuf,
    pub models: ModelConfig,
    pub request_timeout: Duration,
    pub client_name: String,
    pub client_version: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            command: "node".to_string(),
            args: vec!["node_modules/vibe-coder-mcp/build/index.js".to_string()],
            env: HashMap::new(),
            api_key: None,
            project_root: PathBuf::from("../generated-projects"),
            output_dir: PathBuf::from("../generated-projects/VibeCoderOutput"),
            models: ModelConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            client_name: "sitewright".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl BridgeConfig {
    /// Replace command and arguments from a whitespace-separated command line.
    /// A blank line leaves the current command untouched.
    pub fn with_command_line(mut self, command_line: &str) -> Self {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        if let Some(command) = parts.next() {
            self.command = command;
            self.args = parts.collect();
        }
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// The API key, if set to something non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }

    /// Full command line, for logging
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Environment the tool server is started with, on top of the inherited one
    pub fn child_env(&self) -> Vec<(String, String)> {
        let mut env: Vec<(String, String)> = self
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if let Some(key) = self.api_key() {
            env.push(("OPENROUTER_API_KEY".to_string(), key.to_string()));
        }
        env.push((
            "VIBE_PROJECT_ROOT".to_string(),
            absolute(&self.project_root).display().to_string(),
        ));
        env.push((
            "VIBE_CODER_OUTPUT_DIR".to_string(),
            absolute(&self.output_dir).display().to_string(),
        ));
        env.push((
            "GEMINI_MODEL".to_string(),
            self.models.code_generation.clone(),
        ));
        env.push(("LOG_LEVEL".to_string(), "error".to_string()));
        env.push(("MCP_TRANSPORT".to_string(), "stdio".to_string()));
        env.push(("NODE_NO_WARNINGS".to_string(), "1".to_string()));
        env
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(env: &'a [(String, String)], key: &str) -> Option<&'a str> {
        env.iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_child_env_contains_fixed_settings() {
        let mut config = BridgeConfig::default().with_api_key("sk-or-test");
        config.models.code_generation = "some/coder".to_string();

        let env = config.child_env();
        assert_eq!(lookup(&env, "OPENROUTER_API_KEY"), Some("sk-or-test"));
        assert_eq!(lookup(&env, "GEMINI_MODEL"), Some("some/coder"));
        assert_eq!(lookup(&env, "LOG_LEVEL"), Some("error"));
        assert_eq!(lookup(&env, "MCP_TRANSPORT"), Some("stdio"));
        assert_eq!(lookup(&env, "NODE_NO_WARNINGS"), Some("1"));

        let root = lookup(&env, "VIBE_PROJECT_ROOT").unwrap();
        assert!(Path::new(root).is_absolute());
        assert!(root.ends_with("generated-projects"));
    }

    #[test]
    fn test_blank_api_key_is_treated_as_missing() {
        let config = BridgeConfig::default().with_api_key("   ");
        assert!(config.api_key().is_none());
        assert!(lookup(&config.child_env(), "OPENROUTER_API_KEY").is_none());
    }

    #[test]
    fn test_command_line_override() {
        let config = BridgeConfig::default().with_command_line("npx -y vibe-coder-mcp");
        assert_eq!(config.command, "npx");
        assert_eq!(config.args, vec!["-y", "vibe-coder-mcp"]);
        assert_eq!(config.command_line(), "npx -y vibe-coder-mcp");

        let unchanged = BridgeConfig::default().with_command_line("  ");
        assert_eq!(unchanged.command, "node");
    }

    #[test]
    fn test_stage_models() {
        let models = ModelConfig {
            prd: "p".into(),
            ..ModelConfig::default()
        };
        assert_eq!(models.for_stage(PipelineStage::Prd), "p");
        assert_eq!(models.for_stage(PipelineStage::Research), DEFAULT_STAGE_MODEL);
        assert_eq!(PipelineStage::UserStories.to_string(), "user_stories");
    }
}
