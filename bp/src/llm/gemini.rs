//! Google Gemini API client implementation
//!
//! Implements LlmClient for the `generateContent` endpoint. Chat sessions keep
//! their own `contents` history and resend it on every turn.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::parse_retry_after;
use super::{ChatSession, GenerateRequest, GenerateResponse, LlmClient, LlmError, Message, ResponseFormat, Role, TokenUsage};
use crate::config::LlmConfig;

/// Gemini API client
pub struct GeminiClient {
    inner: Arc<GeminiInner>,
}

struct GeminiInner {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a new client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "GeminiClient::from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;

        let timeout = config.timeout();
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            inner: Arc::new(GeminiInner {
                model: config.model.clone(),
                api_key,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                http,
                max_tokens: config.max_tokens,
                timeout,
            }),
        })
    }
}

impl GeminiInner {
    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Build the request body for the Gemini API
    fn build_request_body(
        &self,
        system_instruction: Option<&str>,
        contents: Vec<GeminiContent>,
        format: &ResponseFormat,
        max_tokens: u32,
    ) -> GeminiRequest {
        debug!(model = %self.model, contents = contents.len(), json = format.is_json(), "build_request_body: called");
        let (response_mime_type, response_schema) = match format {
            ResponseFormat::Text => (None, None),
            ResponseFormat::JsonSchema { schema, .. } => (Some("application/json".to_string()), Some(schema.clone())),
        };

        GeminiRequest {
            contents,
            system_instruction: system_instruction.map(|text| GeminiSystemInstruction {
                parts: vec![GeminiPart { text: text.to_string() }],
            }),
            generation_config: GeminiGenerationConfig {
                max_output_tokens: max_tokens.min(self.max_tokens),
                response_mime_type,
                response_schema,
            },
        }
    }

    /// POST a generateContent request and parse the reply
    async fn generate_content(&self, body: &GeminiRequest) -> Result<GenerateResponse, LlmError> {
        debug!(model = %self.model, "generate_content: called");
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status.as_u16(), "generate_content: API error");
            return Err(LlmError::from_status(status.as_u16(), retry_after, &text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| LlmError::from_transport(e, self.timeout))?;
        let api_response: GeminiResponse = serde_json::from_str(&text)?;
        Ok(parse_response(api_response))
    }
}

/// Convert the API response into a GenerateResponse
///
/// A response without candidates (for example a blocked prompt) yields
/// `text: None` rather than an error.
fn parse_response(api_response: GeminiResponse) -> GenerateResponse {
    let usage = api_response
        .usage_metadata
        .map(|u| TokenUsage {
            input_tokens: u.prompt_token_count.unwrap_or(0),
            output_tokens: u.candidates_token_count.unwrap_or(0),
        })
        .unwrap_or_default();

    let Some(candidate) = api_response.candidates.into_iter().next() else {
        debug!("parse_response: no candidates");
        return GenerateResponse {
            text: None,
            usage,
            finish_reason: None,
        };
    };

    let text = candidate.content.map(|c| {
        c.parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("")
    });

    debug!(finish_reason = ?candidate.finish_reason, total_tokens = usage.total(), "parse_response: parsed");
    GenerateResponse {
        text,
        usage,
        finish_reason: candidate.finish_reason,
    }
}

fn to_gemini_content(message: &Message) -> GeminiContent {
    let role = match message.role {
        Role::User => "user",
        Role::Assistant => "model",
    };
    GeminiContent {
        role: role.to_string(),
        parts: vec![GeminiPart {
            text: message.content.clone(),
        }],
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn start_chat(&self, system_instruction: &str, max_tokens: u32) -> Result<Box<dyn ChatSession>, LlmError> {
        debug!(max_tokens, "GeminiClient::start_chat: called");
        Ok(Box::new(GeminiChatSession {
            inner: self.inner.clone(),
            system_instruction: system_instruction.to_string(),
            max_tokens,
            history: Vec::new(),
        }))
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        debug!(prompt_len = request.prompt.len(), "GeminiClient::generate: called");
        let contents = vec![to_gemini_content(&Message::user(request.prompt.clone()))];
        let body = self.inner.build_request_body(
            request.system_instruction.as_deref(),
            contents,
            &request.response_format,
            request.max_tokens,
        );
        self.inner.generate_content(&body).await
    }
}

/// Conversational session against Gemini
pub struct GeminiChatSession {
    inner: Arc<GeminiInner>,
    system_instruction: String,
    max_tokens: u32,
    history: Vec<Message>,
}

impl GeminiChatSession {
    /// Add a completed exchange to the history and return the reply text
    ///
    /// Gemini rejects a `model` turn whose only part is empty, so a blank or
    /// blocked reply leaves the history unchanged and yields `""`.
    fn record_reply(&mut self, user: Message, response: &GenerateResponse) -> String {
        let Some(reply) = response.non_empty_text() else {
            warn!(finish_reason = ?response.finish_reason, "GeminiChatSession::record_reply: empty reply, not recorded");
            return String::new();
        };
        let reply = reply.to_string();
        self.history.push(user);
        self.history.push(Message::assistant(reply.clone()));
        reply
    }
}

#[async_trait]
impl ChatSession for GeminiChatSession {
    async fn send(&mut self, text: &str) -> Result<String, LlmError> {
        debug!(history = self.history.len(), "GeminiChatSession::send: called");
        let user = Message::user(text);
        let contents = self
            .history
            .iter()
            .chain(std::iter::once(&user))
            .map(to_gemini_content)
            .collect();

        let body = self.inner.build_request_body(
            Some(&self.system_instruction),
            contents,
            &ResponseFormat::Text,
            self.max_tokens,
        );
        let response = self.inner.generate_content(&body).await?;
        Ok(self.record_reply(user, &response))
    }

    fn history(&self) -> &[Message] {
        &self.history
    }
}

// Gemini API request/response structures

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
struct GeminiUsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u64>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u64>,
}
