//! Completion provider trait for grounded answer generation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::error::Result;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A chat model that turns a transcript into a reply.
///
/// The transcript is always `[system, history..., grounded user message]`.
/// Failures should be reported as
/// [`RagError::GenerationError`](crate::RagError::GenerationError) so callers
/// can tell an unavailable upstream apart from a local fault.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Produce the assistant reply for `messages`.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        settings: &GenerationConfig,
    ) -> Result<String>;

    /// Provider name used in logs.
    fn name(&self) -> &str;
}
