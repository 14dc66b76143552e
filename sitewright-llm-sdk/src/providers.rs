//! Provider name constants
//!
//! This module defines canonical provider names used throughout the SDK

/// OpenRouter (OpenAI-compatible gateway)
pub const OPENROUTER: &str = "openrouter";
