pub mod config;
pub mod error;
pub mod handlers;
pub mod helpers;
pub mod models;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::configure_routes;
pub use state::{AppState, SessionLocks};
