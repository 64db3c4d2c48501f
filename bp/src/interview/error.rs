//! Interview error types

use thiserror::Error;

use super::Phase;
use crate::generate::BatchError;

/// Errors returned by [`super::InterviewSession`] operations
///
/// None of these change session state. `TooFewTurns` and
/// `GenerationFailed` display their localized user-facing message.
#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("cannot {operation} while {phase}")]
    InvalidPhase { operation: &'static str, phase: Phase },

    #[error("message is empty")]
    EmptyInput,

    #[error("a reply is still pending")]
    Busy,

    #[error("{message}")]
    TooFewTurns { have: usize, need: usize, message: String },

    #[error("{message}")]
    GenerationFailed {
        message: String,
        #[source]
        source: BatchError,
    },
}

impl InterviewError {
    /// True for errors caused by the caller rather than the service
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::GenerationFailed { .. })
    }
}
