use chrono::Utc;

/// Use the client's session id, or mint `session_<unix-millis>`
pub fn resolve_session_id(requested: Option<&str>) -> String {
    match requested.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => format!("session_{}", Utc::now().timestamp_millis()),
    }
}
