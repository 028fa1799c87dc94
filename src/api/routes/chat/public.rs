//! Public types for the chat API
use serde::Deserialize;

use crate::openai::Message;

/// Error messages returned to the browser. Upstream details are only
/// ever logged.
pub const RATE_LIMITED: &str = "Rate limit exceeded. Please try again later.";
pub const UNAVAILABLE: &str = "Service temporarily unavailable.";
pub const AI_SERVICE_ERROR: &str = "AI service error";
pub const NOT_CONFIGURED: &str = "AI service is not configured";

#[derive(Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}
