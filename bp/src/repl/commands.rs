//! Slash command parsing

use std::path::PathBuf;

use crate::generate::DocumentKind;

/// A parsed line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Free text sent to the consultant
    Answer(String),
    Command(SlashCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Quit,
    /// End the interview and generate documents
    Finish,
    /// Print the transcript so far
    Transcript,
    /// List the generated documents
    Documents,
    /// Print one generated document
    Show(DocumentKind),
    /// Write the bundle to disk, optionally under another base directory
    Export(Option<PathBuf>),
    /// Discard the results and start a new interview
    New,
    /// Anything not recognized, with the reason
    Invalid(String),
}

impl Input {
    /// Parse one trimmed, non-empty input line
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if !line.starts_with('/') {
            return Self::Answer(line.to_string());
        }

        let mut parts = line.splitn(2, char::is_whitespace);
        let cmd = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).filter(|s| !s.is_empty());

        let command = match cmd {
            "/help" | "/h" | "/?" => SlashCommand::Help,
            "/quit" | "/q" | "/exit" => SlashCommand::Quit,
            "/finish" | "/done" | "/f" => SlashCommand::Finish,
            "/transcript" | "/history" | "/t" => SlashCommand::Transcript,
            "/docs" | "/documents" | "/d" => SlashCommand::Documents,
            "/show" | "/s" => match arg {
                Some(name) => match DocumentKind::from_name(name) {
                    Some(kind) => SlashCommand::Show(kind),
                    None => SlashCommand::Invalid(format!("Unknown document: {}", name)),
                },
                None => SlashCommand::Invalid("Usage: /show <document>".to_string()),
            },
            "/export" | "/e" => SlashCommand::Export(arg.map(PathBuf::from)),
            "/new" | "/n" => SlashCommand::New,
            other => SlashCommand::Invalid(format!("Unknown command: {}", other)),
        };
        Self::Command(command)
    }
}
