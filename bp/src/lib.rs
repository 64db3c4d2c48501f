//! bizplan - Conversational Business-Plan Generator
//!
//! bizplan interviews a founder through an LLM chat session, then fans the
//! finished transcript out to nine document generators that run in parallel
//! and produce a complete planning bundle.
//!
//! # Core Concepts
//!
//! - **Append-only Transcript**: every turn is recorded in order and never edited
//! - **Owned Chat Session**: the interview owns its conversational handle
//! - **All or Nothing**: the nine documents are committed together or not at all
//! - **Graceful Degradation**: chat failures become visible fallback turns
//!
//! # Modules
//!
//! - [`transcript`] - Turns and the append-only transcript
//! - [`llm`] - LLM client trait, chat sessions, Gemini and OpenAI adapters
//! - [`canvas`] - Business Model Canvas data contract and validation
//! - [`prompts`] - Prompt templates for the interviewer and each document
//! - [`generate`] - Document generators and the fail-fast aggregate join
//! - [`bundle`] - The nine-document result bundle and Markdown export
//! - [`interview`] - Interview state machine (the orchestrator)
//! - [`repl`] - Terminal front end
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod bundle;
pub mod canvas;
pub mod cli;
pub mod config;
pub mod generate;
pub mod interview;
pub mod llm;
pub mod prompts;
pub mod repl;
pub mod transcript;

pub use bundle::DocumentBundle;
pub use canvas::BusinessModelCanvas;
pub use config::Config;
pub use generate::{DocumentGenerator, DocumentKind};
pub use interview::{Exchange, InterviewError, InterviewSession, Phase};
pub use transcript::{Speaker, Transcript, Turn};
