//! Route table shared by the server binary and the integration tests.

use crate::error::ApiError;
use crate::handlers::{conversation, health, ui};
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(health::health)
        .service(health::service_info)
        .service(
            web::scope("/api/conversation")
                .service(conversation::chat)
                .service(conversation::chat_stream)
                .service(conversation::get_history)
                .service(conversation::clear_history),
        )
        .service(ui::index)
        .service(ui::app_js)
        .service(ui::app_css);
}

/// Malformed bodies get the same `{success:false,error}` envelope as other failures
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}
