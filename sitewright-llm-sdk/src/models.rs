//! Model constants for the OpenRouter gateway
//!
//! Model IDs use OpenRouter's `vendor/model[:variant]` naming.

/// Conversation model used by the chat orchestrator
pub mod chat {
    /// Gemini 2.0 Flash (experimental, free tier)
    pub const GEMINI_2_0_FLASH_FREE_ID: &str = "google/gemini-2.0-flash-exp:free";

    pub const DEFAULT: &str = GEMINI_2_0_FLASH_FREE_ID;
}
