//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::LlmConfig;

/// bizplan - Conversational Business-Plan Generator
#[derive(Parser)]
#[command(
    name = "bp",
    about = "Interview a founder and generate a complete business plan",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (default: interview)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run an interactive interview and generate documents
    Interview {
        /// Base directory for /export (overrides export.dir)
        #[arg(short, long, value_name = "DIR")]
        export_dir: Option<PathBuf>,
    },

    /// List prompt templates, or print one
    Prompts {
        /// Template name (e.g. interviewer, hr-plan)
        name: Option<String>,
    },

    /// Print the effective configuration as YAML
    Config,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bizplan")
        .join("logs")
        .join("bizplan.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text with API key status and log location
pub fn generate_after_help(llm: &LlmConfig) -> String {
    debug!(provider = %llm.provider, "generate_after_help: called");
    let mut help = String::new();

    help.push_str("LLM:\n");
    let (icon, status) = match llm.get_api_key() {
        Ok(_) => ("\u{2705}", "API key found"),
        Err(_) => ("\u{274C}", "API key missing"),
    };
    help.push_str(&format!("  {} {} / {} ({}: {})\n", icon, llm.provider, llm.model, llm.api_key_env, status));

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));

    help
}
