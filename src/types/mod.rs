//! Request and response types for the chat completion endpoint.

mod chat;

pub use chat::{AssistantMessage, ChatMessage, ChatRequest, ChatResponse, Choice, Role};
