use crate::config::LlmConfig;
use sitewright_llm_sdk::client::LlmClient;
use sitewright_llm_sdk::openrouter::OpenRouterClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Build the chat-completions client, or `None` when no API key is configured
pub fn create_llm_client(config: &LlmConfig) -> anyhow::Result<Option<Arc<dyn LlmClient>>> {
    let Some(api_key) = config.api_key() else {
        warn!("OPENROUTER_API_KEY is not set; chat endpoints will fail until it is configured");
        return Ok(None);
    };

    let client = OpenRouterClient::new(api_key)?
        .with_base_url(&config.base_url)
        .with_model(&config.model)
        .with_app_identity(&config.app_referer, &config.app_title)
        .with_timeout(Duration::from_secs(config.timeout_secs))?;

    info!(
        provider = %client.provider_name(),
        model = %client.model_name(),
        "LLM client configured"
    );
    Ok(Some(Arc::new(client)))
}
