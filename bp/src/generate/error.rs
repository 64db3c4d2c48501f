//! Document generation error types

use thiserror::Error;

use super::DocumentKind;
use crate::llm::LlmError;

/// Failure of a single generator
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{kind}: failed to render prompt: {message}")]
    Prompt { kind: DocumentKind, message: String },

    #[error("{kind}: {source}")]
    Llm {
        kind: DocumentKind,
        #[source]
        source: LlmError,
    },
}

impl GenerationError {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Prompt { kind, .. } | Self::Llm { kind, .. } => *kind,
        }
    }
}

/// Aggregate failure of a document batch
///
/// Lists every generator that failed. Successful siblings are discarded.
#[derive(Debug, Error)]
#[error("{} of {} documents failed: {}", .failures.len(), DocumentKind::ALL.len(), summarize(.failures))]
pub struct BatchError {
    pub failures: Vec<GenerationError>,
}

impl BatchError {
    pub fn failed_kinds(&self) -> Vec<DocumentKind> {
        self.failures.iter().map(GenerationError::kind).collect()
    }
}

fn summarize(failures: &[GenerationError]) -> String {
    failures.iter().map(|f| f.to_string()).collect::<Vec<_>>().join("; ")
}
