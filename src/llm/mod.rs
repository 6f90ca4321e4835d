//! Chat-completion collaborator used for diet plans, the assistant chat and
//! lifestyle suggestions.

pub mod client;
pub mod prompts;
pub mod sections;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::CompletionClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat model is not configured: {0} is not set")]
    NotConfigured(&'static str),
    #[error("chat request failed: {0}")]
    Request(String),
    #[error("chat model returned no message")]
    EmptyResponse,
}

/// Produces the assistant's reply to a conversation.
pub trait ChatClient: Send + Sync {
    fn complete<'a>(&'a self, messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String, ChatError>>;
}
