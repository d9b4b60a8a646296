//! AI assistant backend abstraction
//!
//! The dashboard uses two completion profiles: a slow, thorough one for
//! log analysis and a fast one for short chat replies. The backend itself
//! is a black box that turns a prompt into text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BridgeResult;

/// Which completion profile a request should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantProfile {
    /// Deep reasoning over a log excerpt
    Analysis,
    /// Short conversational reply
    Chat,
}

/// A single text-completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub profile: AssistantProfile,
    /// System instruction framing the assistant's role
    pub system: String,
    /// User content
    pub prompt: String,
}

#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> BridgeResult<String>;
}
