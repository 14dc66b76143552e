pub mod bridge;
pub mod llm;
pub mod session;
