use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use sitewright_agents::{SamplingSettings, DEFAULT_MAX_TOOL_ROUNDS};
use sitewright_llm_sdk::{models, openrouter::DEFAULT_BASE_URL};
use sitewright_tools::{BridgeConfig, ModelConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3002;

/// Environment variables mapped onto config keys
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("HOST", "server.host"),
    ("PORT", "server.port"),
    ("OPENROUTER_API_KEY", "llm.api_key"),
    ("LLM_MODEL", "llm.model"),
    ("MCP_SERVER_COMMAND", "mcp.command"),
    ("VIBE_PROJECT_ROOT", "mcp.project_root"),
    ("VIBE_CODER_OUTPUT_DIR", "mcp.output_dir"),
    ("RESEARCH_MODEL", "mcp.models.research"),
    ("PRD_MODEL", "mcp.models.prd"),
    ("USER_STORIES_MODEL", "mcp.models.user_stories"),
    ("TASK_LIST_MODEL", "mcp.models.task_list"),
    ("CODE_GENERATION_MODEL", "mcp.models.code_generation"),
];

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub mcp: McpConfig,
    pub cors: CorsConfig,
    pub sessions: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub max_tool_rounds: usize,
    pub timeout_secs: u64,
    pub app_referer: String,
    pub app_title: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let sampling = SamplingSettings::default();
        Self {
            api_key: None,
            model: models::chat::DEFAULT.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
            top_p: sampling.top_p,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            timeout_secs: 120,
            app_referer: "https://github.com/sitewright/sitewright".to_string(),
            app_title: "Sitewright".to_string(),
        }
    }
}

impl LlmConfig {
    /// The API key, if set to something non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }

    pub fn sampling(&self) -> SamplingSettings {
        SamplingSettings {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct McpConfig {
    /// Command line that starts the tool server
    pub command: String,
    pub project_root: PathBuf,
    pub output_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub models: ModelConfig,
}

impl Default for McpConfig {
    fn default() -> Self {
        let bridge = BridgeConfig::default();
        Self {
            command: bridge.command_line(),
            project_root: bridge.project_root,
            output_dir: bridge.output_dir,
            request_timeout_secs: bridge.request_timeout.as_secs(),
            models: bridge.models,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CorsConfig {
    /// `*` allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct SessionConfig {
    /// Unbounded when unset
    pub max_sessions: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write a daily-rolling log file here when set
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: "sitewright-api.log".to_string(),
        }
    }
}

impl ApiConfig {
    /// Load from `path`, or from the default location (writing a commented
    /// default file there on first run), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = get_config_path();
                write_default_config(&path)?;
                path
            }
        };

        let env: HashMap<String, String> = std::env::vars().collect();
        let config = Self::from_sources(Some(&config_path), &env)?;
        Ok((config, config_path))
    }

    /// Layer defaults, an optional TOML file and environment overrides
    pub fn from_sources(
        path: Option<&Path>,
        env: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        }

        for (var, key) in ENV_OVERRIDES {
            let value = env
                .get(*var)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string);
            builder = builder.set_override_option(*key, value)?;
        }

        if let Some(origins) = env.get("FRONTEND_URL") {
            let origins: Vec<String> = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
            if !origins.is_empty() {
                builder = builder.set_override("cors.allowed_origins", origins)?;
            }
        }

        builder.build()?.try_deserialize()
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn bridge_config(&self) -> BridgeConfig {
        let config = BridgeConfig {
            project_root: self.mcp.project_root.clone(),
            output_dir: self.mcp.output_dir.clone(),
            models: self.mcp.models.clone(),
            request_timeout: Duration::from_secs(self.mcp.request_timeout_secs),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            ..BridgeConfig::default()
        }
        .with_command_line(&self.mcp.command);

        match self.llm.api_key() {
            Some(key) => config.with_api_key(key),
            None => config,
        }
    }
}

fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("sitewright/api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}

fn write_default_config(config_path: &Path) -> Result<(), ConfigError> {
    if config_path.exists() {
        return Ok(());
    }
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::Message(format!("Failed to create config directory: {e}"))
        })?;
    }

    let default_config = format!(
        r#"# Environment variables (PORT, OPENROUTER_API_KEY, LLM_MODEL, ...) override these values

[server]
host = "127.0.0.1"
port = {port}

[llm]
# api_key = "your-openrouter-key"
model = "{model}"
# temperature = 0.6
# max_tokens = 4096
# top_p = 0.95
# max_tool_rounds = {rounds}

[mcp]
# command = "node node_modules/vibe-coder-mcp/build/index.js"
# project_root = "../generated-projects"
# output_dir = "../generated-projects/VibeCoderOutput"

[mcp.models]
# research = "x-ai/grok-beta:free"
# code_generation = "x-ai/grok-beta:free"

[cors]
allowed_origins = ["*"]

[sessions]
# max_sessions = 1000

[logging]
# directory = "/var/log/sitewright"
"#,
        port = DEFAULT_PORT,
        model = models::chat::DEFAULT,
        rounds = DEFAULT_MAX_TOOL_ROUNDS,
    );

    std::fs::write(config_path, default_config)
        .map_err(|e| ConfigError::Message(format!("Failed to write default config: {e}")))
}
