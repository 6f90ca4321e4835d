//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use anyhow::Context;
use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Settings;

use super::{ChatClient, ChatError, ChatMessage};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

/// Talks to any `/chat/completions` endpoint (Groq by default).
///
/// A missing API key is only reported when a completion is requested, so the
/// rest of the service runs without one.
pub struct CompletionClient {
    client: Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl CompletionClient {
    pub fn new(url: &str, api_key: Option<String>, model: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("janani-assistant/0.1")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building chat client")?;
        Ok(Self {
            client,
            url: url.to_string(),
            api_key,
            model: model.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        info!(url = %settings.chat_api_url, model = %settings.chat_model, "using chat model");
        Self::new(
            &settings.chat_api_url,
            settings.chat_api_key.clone(),
            &settings.chat_model,
        )
    }
}

impl ChatClient for CompletionClient {
    fn complete<'a>(&'a self, messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String, ChatError>> {
        Box::pin(async move {
            let api_key = self
                .api_key
                .as_deref()
                .ok_or(ChatError::NotConfigured("GROQ_API_KEY"))?;
            let response: CompletionResponse = self
                .client
                .post(&self.url)
                .bearer_auth(api_key)
                .json(&CompletionRequest {
                    model: &self.model,
                    messages,
                })
                .send()
                .await
                .map_err(|e| ChatError::Request(e.to_string()))?
                .error_for_status()
                .map_err(|e| ChatError::Request(e.to_string()))?
                .json()
                .await
                .map_err(|e| ChatError::Request(e.to_string()))?;
            let content = first_content(response)?;
            debug!(model = %self.model, turns = messages.len(), chars = content.len(), "chat completion received");
            Ok(content)
        })
    }
}

fn first_content(response: CompletionResponse) -> Result<String, ChatError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ChatError::EmptyResponse)
}
