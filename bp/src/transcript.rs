//! Interview transcript
//!
//! An ordered, append-only record of every utterance exchanged during the
//! interview. Every document generator consumes the rendered dialogue.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Label used when rendering the dialogue for generators
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Consultant",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single utterance, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    speaker: Speaker,
    text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_user(&self) -> bool {
        self.speaker == Speaker::User
    }
}

/// Append-only sequence of turns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn and return a copy of it
    pub fn push_user(&mut self, text: impl Into<String>) -> Turn {
        let turn = Turn::user(text);
        debug!(index = self.turns.len(), "Transcript::push_user: called");
        self.turns.push(turn.clone());
        turn
    }

    /// Append an assistant turn and return a copy of it
    pub fn push_assistant(&mut self, text: impl Into<String>) -> Turn {
        let turn = Turn::assistant(text);
        debug!(index = self.turns.len(), "Transcript::push_assistant: called");
        self.turns.push(turn.clone());
        turn
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Frozen copy handed to the generators
    pub fn snapshot(&self) -> Transcript {
        self.clone()
    }

    /// Render as speaker-labeled lines in chronological order
    ///
    /// ```text
    /// Consultant: What is your business idea?
    /// User: A bakery.
    /// ```
    pub fn render_dialogue(&self) -> String {
        debug!(turns = self.turns.len(), "Transcript::render_dialogue: called");
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.speaker.label(), t.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
