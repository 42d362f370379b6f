//! Chat completion wire types.

use serde::{Deserialize, Serialize};

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message.
    System,
    /// User message.
    User,
    /// Assistant message.
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Chat completion request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation, system message first.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Presence penalty.
    pub presence_penalty: f32,
    /// Frequency penalty.
    pub frequency_penalty: f32,
}

/// Chat completion response body.
///
/// Only the fields the client reads are modelled; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Response ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Response choices.
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl ChatResponse {
    /// Gets the content of the first choice whose text is not blank.
    pub fn content(&self) -> Option<&str> {
        self.choices.iter().find_map(|c| {
            c.message
                .content
                .as_deref()
                .filter(|text| !text.trim().is_empty())
        })
    }
}

/// A response choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// Choice index.
    #[serde(default)]
    pub index: u32,
    /// Generated message.
    pub message: AssistantMessage,
    /// Finish reason as reported by the server.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Assistant message inside a choice.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantMessage {
    /// Message role as sent by the server. Not restricted to [`Role`].
    #[serde(default)]
    pub role: Option<String>,
    /// Message text.
    #[serde(default)]
    pub content: Option<String>,
}
