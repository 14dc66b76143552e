use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::config::{ModelConfig, PipelineStage};
use crate::error::BridgeError;
use crate::types::{remote, BackendFramework, FrontendFramework};

/// Anything that can run the website-pipeline tools.
///
/// Implementors only provide `execute_tool`; the typed operations map each
/// pipeline step to the remote tool name and argument shape.
#[async_trait]
pub trait ToolServer: Send + Sync {
    /// Call a remote tool by name and return its raw result
    async fn execute_tool(&self, name: &str, arguments: Value) -> Result<Value, BridgeError>;

    fn is_ready(&self) -> bool;

    /// Per-stage model settings, when the server knows them
    fn models(&self) -> Option<&ModelConfig> {
        None
    }

    async fn research(&self, query: &str) -> Result<Value, BridgeError> {
        log_stage(self.models(), PipelineStage::Research);
        self.execute_tool(remote::RESEARCH_MANAGER, json!({ "query": query }))
            .await
    }

    async fn generate_prd(&self, product_description: &str) -> Result<Value, BridgeError> {
        log_stage(self.models(), PipelineStage::Prd);
        self.execute_tool(
            remote::PRD_GENERATOR,
            json!({ "productDescription": product_description }),
        )
        .await
    }

    async fn generate_user_stories(&self, prd_content: &str) -> Result<Value, BridgeError> {
        log_stage(self.models(), PipelineStage::UserStories);
        self.execute_tool(
            remote::USER_STORIES_GENERATOR,
            json!({ "productDescription": prd_content }),
        )
        .await
    }

    async fn generate_task_list(&self, user_stories: &str) -> Result<Value, BridgeError> {
        log_stage(self.models(), PipelineStage::TaskList);
        self.execute_tool(
            remote::TASK_LIST_GENERATOR,
            json!({
                "productDescription": user_stories,
                "userStories": user_stories,
            }),
        )
        .await
    }

    async fn generate_starter_kit(
        &self,
        product_description: &str,
        frontend: FrontendFramework,
        backend: BackendFramework,
    ) -> Result<Value, BridgeError> {
        log_stage(self.models(), PipelineStage::CodeGeneration);
        info!(frontend = %frontend, backend = %backend, "Generating starter kit");
        self.execute_tool(
            remote::STARTER_KIT_GENERATOR,
            json!({
                "use_case": product_description,
                "frontend_framework": frontend.as_str(),
                "backend_framework": backend.as_str(),
            }),
        )
        .await
    }
}

fn log_stage(models: Option<&ModelConfig>, stage: PipelineStage) {
    match models {
        Some(models) => info!(stage = %stage, model = models.for_stage(stage), "Running pipeline stage"),
        None => info!(stage = %stage, "Running pipeline stage"),
    }
}
