//! LLM request and response types

use serde::{Deserialize, Serialize};

/// Message role in a chat conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a chat session's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Output constraint for a one-shot call
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResponseFormat {
    /// Free text (Markdown)
    #[default]
    Text,
    /// JSON constrained to a schema
    JsonSchema { name: String, schema: serde_json::Value },
}

impl ResponseFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::JsonSchema { .. })
    }
}

/// A stateless one-shot generation request
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub system_instruction: Option<String>,
    pub prompt: String,
    pub response_format: ResponseFormat,
    pub max_tokens: u32,
}

impl GenerateRequest {
    pub fn text(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system_instruction: None,
            prompt: prompt.into(),
            response_format: ResponseFormat::Text,
            max_tokens,
        }
    }

    pub fn json(prompt: impl Into<String>, name: impl Into<String>, schema: serde_json::Value, max_tokens: u32) -> Self {
        Self {
            system_instruction: None,
            prompt: prompt.into(),
            response_format: ResponseFormat::JsonSchema {
                name: name.into(),
                schema,
            },
            max_tokens,
        }
    }
}

/// Response from a one-shot generation call
#[derive(Debug, Clone, Default)]
pub struct GenerateResponse {
    /// Text content; `None` when the service returned no candidate text
    pub text: Option<String>,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

impl GenerateResponse {
    /// Text with surrounding whitespace removed, `None` when blank
    pub fn non_empty_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}
