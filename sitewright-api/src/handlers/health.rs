use crate::state::AppState;
use actix_web::{get, web, HttpResponse, Responder};
use shared_types::{EndpointInfo, HealthResponse, ServiceInfo};

#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse::ok(
        state.tools.is_ready(),
        state.llm_configured(),
    ))
}

#[get("/api")]
pub async fn service_info() -> impl Responder {
    let endpoints = [
        ("chat", "POST /api/conversation/chat"),
        ("streamChat", "POST /api/conversation/chat/stream"),
        ("history", "GET /api/conversation/history/{sessionId}"),
        ("clearHistory", "DELETE /api/conversation/history/{sessionId}"),
        ("health", "GET /health"),
        ("ui", "GET /"),
    ]
    .into_iter()
    .map(|(name, route)| EndpointInfo {
        name: name.to_string(),
        route: route.to_string(),
    })
    .collect();

    HttpResponse::Ok().json(ServiceInfo {
        message: "Sitewright conversational website builder API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: vec![
            "OpenRouter conversational AI".to_string(),
            "MCP tool execution".to_string(),
            "Server-sent event streaming".to_string(),
        ],
        endpoints,
    })
}
