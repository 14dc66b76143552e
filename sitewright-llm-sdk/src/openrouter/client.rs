use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use std::time::Duration;

use crate::{
    client::{ChunkStream, LlmClient},
    error::LlmError,
    models::chat::DEFAULT as DEFAULT_MODEL,
    openrouter::sse::decode_chunk_stream,
    providers::OPENROUTER,
    types::{ChatCompletionRequest, ChatCompletionResponse},
};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// OpenRouter chat-completions client
pub struct OpenRouterClient {
    api_key: String,
    base_url: String,
    model: String,
    referer: Option<String>,
    title: Option<String>,
    http_client: reqwest::Client,
}

impl OpenRouterClient {
    /// Create a new OpenRouter client with the given API key
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::authentication("API key cannot be empty"));
        }

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            referer: None,
            title: None,
            http_client: build_http_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
        })
    }

    /// Set a custom base URL for the API
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Model used when a request leaves `model` empty
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Attribution headers OpenRouter shows in its dashboard
    pub fn with_app_identity(mut self, referer: impl Into<String>, title: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self.title = Some(title.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.http_client = build_http_client(timeout)?;
        Ok(self)
    }

    fn headers(&self, streaming: bool) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|_| LlmError::authentication("Invalid API key format"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if streaming {
            headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        }
        if let Some(referer) = &self.referer {
            if let Ok(value) = HeaderValue::from_str(referer) {
                headers.insert("http-referer", value);
            }
        }
        if let Some(title) = &self.title {
            if let Ok(value) = HeaderValue::from_str(title) {
                headers.insert("x-title", value);
            }
        }
        Ok(headers)
    }

    async fn send(
        &self,
        mut request: ChatCompletionRequest,
        streaming: bool,
    ) -> Result<reqwest::Response, LlmError> {
        if request.model.is_empty() {
            request.model = self.model.clone();
        }
        request.stream = streaming.then_some(true);

        let url = format!("{}/v1/chat/completions", self.base_url);
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            streaming,
            "Sending chat completion request"
        );

        let response = self
            .http_client
            .post(&url)
            .headers(self.headers(streaming)?)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Extract retry-after header before consuming the response
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<ErrorBody>(&error_text)
            .map(|body| body.error.message)
            .unwrap_or(error_text);

        tracing::warn!(status = status.as_u16(), error = %message, "Chat completion failed");
        Err(LlmError::from_status(status, message, retry_after))
    }
}

fn build_http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Network { source: e })
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError> {
        let response = self.send(request, false).await?;
        let body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::internal(format!("Failed to parse response: {}", e)))?;
        if parsed.choices.is_empty() {
            return Err(LlmError::internal("Response contained no choices"));
        }
        Ok(parsed)
    }

    async fn stream_complete(&self, request: ChatCompletionRequest) -> Result<ChunkStream, LlmError> {
        let response = self.send(request, true).await?;
        Ok(decode_chunk_stream(response.bytes_stream()))
    }

    fn provider_name(&self) -> &str {
        OPENROUTER
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}
