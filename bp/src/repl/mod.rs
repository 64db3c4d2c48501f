//! Interactive terminal front end
//!
//! Renders the interview as a line-oriented chat: the consultant's questions
//! are printed, the user's answers are read with readline, and slash
//! commands finish the interview and browse or export the documents.

mod commands;
mod session;

pub use commands::{Input, SlashCommand};
pub use session::ReplSession;

use std::path::PathBuf;
use std::sync::Arc;

use eyre::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::interview::InterviewSession;
use crate::llm::create_client;
use crate::prompts::PromptLoader;

/// Run the interactive interview
///
/// This is the main entry point for `bp interview`.
pub async fn run_interactive(config: &Config, export_dir: Option<PathBuf>) -> Result<()> {
    config.validate()?;

    let llm = create_client(&config.llm).map_err(|e| eyre::eyre!("Failed to create LLM client: {}", e))?;

    let worktree = std::env::current_dir().context("Failed to read current directory")?;
    let prompts = Arc::new(PromptLoader::new(config.prompts.dir.as_deref(), &worktree));
    let interview = Arc::new(InterviewSession::from_config(llm, prompts, config)?);
    info!(session_id = %interview.session_id(), provider = %config.llm.provider, model = %config.llm.model, "Interview session created");

    let export_dir = export_dir.unwrap_or_else(|| config.export.dir.clone());
    let mut session = ReplSession::new(interview, export_dir);
    session.run().await
}
