pub mod client;
pub mod sse;

pub use client::{OpenRouterClient, DEFAULT_BASE_URL};
