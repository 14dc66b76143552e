use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared_types::ErrorResponse;
use sitewright_agents::{AgentError, SessionError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("LLM client is not configured; set OPENROUTER_API_KEY and restart")]
    LlmNotConfigured,

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    pub fn message_required() -> Self {
        ApiError::Agent(AgentError::EmptyMessage)
    }

    pub fn session_not_found() -> Self {
        ApiError::NotFound("Session not found".to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Agent(AgentError::EmptyMessage) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::LlmNotConfigured | ApiError::Agent(_) | ApiError::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.to_string()))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
