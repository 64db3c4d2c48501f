//! bizplan - Conversational Business-Plan Generator
//!
//! CLI entry point for interviews and prompt/config inspection.

use std::fs;
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches};
use eyre::{Context, Result};
use tracing::{debug, info};

use bizplan::cli::{Cli, Command, generate_after_help, get_log_path};
use bizplan::config::Config;
use bizplan::prompts::{PromptLoader, TemplateSource, embedded};
use bizplan::repl;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Logging isn't initialized yet, so problems go to stderr
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let help_config = Config::load(None).unwrap_or_default();
    let cmd = Cli::command().after_help(generate_after_help(&help_config.llm));
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        language = %config.interview.language,
        "bizplan loaded config"
    );

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Interview { export_dir }) => repl::run_interactive(&config, export_dir).await,
        Some(Command::Prompts { name }) => cmd_prompts(&config, name.as_deref()),
        Some(Command::Config) => cmd_config(&config),
        None => repl::run_interactive(&config, None).await,
    }
}

/// List templates with their source, or print one template
fn cmd_prompts(config: &Config, name: Option<&str>) -> Result<()> {
    let worktree = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let loader = PromptLoader::new(config.prompts.dir.as_deref(), &worktree);

    match name {
        Some(name) => {
            let template = loader.load_template(name)?;
            print!("{}", template);
        }
        None => {
            for name in embedded::NAMES {
                let source = loader.locate(name).unwrap_or(TemplateSource::Embedded);
                println!("{:24} {}", name, source);
            }
        }
    }
    Ok(())
}

/// Print the effective configuration
fn cmd_config(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}
