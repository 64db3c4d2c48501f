//! LlmClient and ChatSession trait definitions

use async_trait::async_trait;

use super::{GenerateRequest, GenerateResponse, LlmError, Message};

/// Client for a hosted generative-language service
///
/// Offers two call shapes: a conversational session that remembers prior
/// turns, and a stateless one-shot call. Implementations are shared across
/// tasks as `Arc<dyn LlmClient>`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Open a new conversational session
    ///
    /// The returned handle owns the conversation history. No network call is
    /// made until the first `send`.
    fn start_chat(&self, system_instruction: &str, max_tokens: u32) -> Result<Box<dyn ChatSession>, LlmError>;

    /// Run a single stateless generation call
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError>;
}

/// A stateful conversation with the model
///
/// Callers must not issue overlapping sends on one session; `&mut self`
/// enforces that at the type level.
#[async_trait]
pub trait ChatSession: Send {
    /// Send one user utterance and return the model's reply (possibly empty)
    async fn send(&mut self, text: &str) -> Result<String, LlmError>;

    /// Successful exchanges so far, oldest first
    fn history(&self) -> &[Message];
}
