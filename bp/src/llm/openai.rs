//! OpenAI API client implementation
//!
//! Implements LlmClient for OpenAI-compatible Chat Completions endpoints.
//! Structured output uses `response_format: json_schema`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::parse_retry_after;
use super::{ChatSession, GenerateRequest, GenerateResponse, LlmClient, LlmError, Message, ResponseFormat, Role, TokenUsage};
use crate::config::LlmConfig;

/// OpenAI API client
pub struct OpenAIClient {
    inner: Arc<OpenAIInner>,
}

struct OpenAIInner {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAIClient {
    /// Create a new client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, "OpenAIClient::from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;

        let timeout = config.timeout();
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            inner: Arc::new(OpenAIInner {
                model: config.model.clone(),
                api_key,
                base_url: config.resolved_base_url().trim_end_matches('/').to_string(),
                http,
                max_tokens: config.max_tokens,
                timeout,
            }),
        })
    }
}

impl OpenAIInner {
    /// Build the request body for the OpenAI API
    fn build_request_body(
        &self,
        system_instruction: Option<&str>,
        messages: &[Message],
        format: &ResponseFormat,
        max_tokens: u32,
    ) -> serde_json::Value {
        debug!(model = %self.model, messages = messages.len(), "build_request_body: called");

        let mut wire = Vec::with_capacity(messages.len() + 1);
        if let Some(system) = system_instruction {
            wire.push(serde_json::json!({
                "role": "system",
                "content": system,
            }));
        }
        for msg in messages {
            let role = match msg.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            wire.push(serde_json::json!({
                "role": role,
                "content": msg.content,
            }));
        }

        let max_tokens = max_tokens.min(self.max_tokens);

        // GPT-5.x and o-series models use max_completion_tokens instead of max_tokens
        let uses_completion_tokens =
            self.model.starts_with("gpt-5") || self.model.starts_with("o1") || self.model.starts_with("o3");

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": wire,
        });

        if uses_completion_tokens {
            body["max_completion_tokens"] = serde_json::json!(max_tokens);
        } else {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if let ResponseFormat::JsonSchema { name, schema } = format {
            body["response_format"] = serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": name,
                    "schema": schema,
                },
            });
        }

        body
    }

    async fn chat_completion(&self, body: &serde_json::Value) -> Result<GenerateResponse, LlmError> {
        debug!(model = %self.model, "chat_completion: called");
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status.as_u16(), "chat_completion: API error");
            return Err(LlmError::from_status(status.as_u16(), retry_after, &text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| LlmError::from_transport(e, self.timeout))?;
        let api_response: OpenAIResponse = serde_json::from_str(&text)?;
        Ok(parse_response(api_response))
    }
}

fn parse_response(api_response: OpenAIResponse) -> GenerateResponse {
    let usage = api_response
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    match api_response.choices.into_iter().next() {
        Some(choice) => GenerateResponse {
            text: choice.message.content,
            usage,
            finish_reason: choice.finish_reason,
        },
        None => {
            debug!("parse_response: no choices");
            GenerateResponse {
                text: None,
                usage,
                finish_reason: None,
            }
        }
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    fn start_chat(&self, system_instruction: &str, max_tokens: u32) -> Result<Box<dyn ChatSession>, LlmError> {
        debug!(max_tokens, "OpenAIClient::start_chat: called");
        Ok(Box::new(OpenAIChatSession {
            inner: self.inner.clone(),
            system_instruction: system_instruction.to_string(),
            max_tokens,
            history: Vec::new(),
        }))
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        debug!(prompt_len = request.prompt.len(), "OpenAIClient::generate: called");
        let body = self.inner.build_request_body(
            request.system_instruction.as_deref(),
            &[Message::user(request.prompt.clone())],
            &request.response_format,
            request.max_tokens,
        );
        self.inner.chat_completion(&body).await
    }
}

/// Conversational session against an OpenAI-compatible endpoint
pub struct OpenAIChatSession {
    inner: Arc<OpenAIInner>,
    system_instruction: String,
    max_tokens: u32,
    history: Vec<Message>,
}

impl OpenAIChatSession {
    /// Commit `messages` plus the reply as the new history, unless the reply is blank
    fn record_reply(&mut self, messages: Vec<Message>, response: &GenerateResponse) -> String {
        let Some(reply) = response.non_empty_text() else {
            warn!(finish_reason = ?response.finish_reason, "OpenAIChatSession::record_reply: empty reply, not recorded");
            return String::new();
        };
        let reply = reply.to_string();
        self.history = messages;
        self.history.push(Message::assistant(reply.clone()));
        reply
    }
}

#[async_trait]
impl ChatSession for OpenAIChatSession {
    async fn send(&mut self, text: &str) -> Result<String, LlmError> {
        debug!(history = self.history.len(), "OpenAIChatSession::send: called");
        let mut messages = self.history.clone();
        messages.push(Message::user(text));

        let body = self.inner.build_request_body(
            Some(&self.system_instruction),
            &messages,
            &ResponseFormat::Text,
            self.max_tokens,
        );
        let response = self.inner.chat_completion(&body).await?;
        Ok(self.record_reply(messages, &response))
    }

    fn history(&self) -> &[Message] {
        &self.history
    }
}

// OpenAI API response structures

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
