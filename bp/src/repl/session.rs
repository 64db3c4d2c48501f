//! REPL session management

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use super::commands::{Input, SlashCommand};
use crate::generate::DocumentKind;
use crate::interview::{Exchange, InterviewError, InterviewSession, Phase};
use crate::transcript::{Speaker, Turn};

/// Interactive terminal front end for one [`InterviewSession`]
pub struct ReplSession {
    interview: Arc<InterviewSession>,
    export_dir: PathBuf,
}

impl ReplSession {
    pub fn new(interview: Arc<InterviewSession>, export_dir: PathBuf) -> Self {
        Self { interview, export_dir }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();
        self.start_interview().await;

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&self.prompt());

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    match Input::parse(input) {
                        Input::Command(cmd) => match self.handle_command(cmd).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        },
                        Input::Answer(text) => self.answer(&text).await,
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn prompt(&self) -> String {
        let marker = match self.interview.phase() {
            Phase::Results => "done>".bright_blue(),
            _ => format!("[{}]>", self.interview.turn_count()).bright_green(),
        };
        format!("{} ", marker)
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "bizplan - Business Plan Consultant".bright_cyan().bold());
        println!(
            "Answer the consultant's questions. Type {} when you have answered at least {} turns.",
            "/finish".yellow(),
            self.interview.min_turns()
        );
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    async fn start_interview(&self) {
        print_waiting();
        match self.interview.start().await {
            Ok(exchange) => print_exchange(&exchange),
            Err(e) => print_error(&e),
        }
    }

    async fn answer(&self, text: &str) {
        if self.interview.phase() == Phase::Results {
            println!(
                "{} The interview is finished. Use {} to begin again.",
                "!".yellow(),
                "/new".yellow()
            );
            return;
        }

        print_waiting();
        match self.interview.send(text).await {
            Ok(exchange) => print_exchange(&exchange),
            Err(e) => print_error(&e),
        }
    }

    async fn handle_command(&self, cmd: SlashCommand) -> SlashResult {
        debug!(?cmd, "ReplSession::handle_command: called");
        match cmd {
            SlashCommand::Help => self.print_help(),
            SlashCommand::Quit => return SlashResult::Quit,
            SlashCommand::Finish => self.finish().await,
            SlashCommand::Transcript => self.print_transcript(),
            SlashCommand::Documents => self.print_documents(),
            SlashCommand::Show(kind) => self.show(kind),
            SlashCommand::Export(dir) => self.export(dir.as_deref()),
            SlashCommand::New => self.new_interview().await,
            SlashCommand::Invalid(msg) => {
                println!("{} {}", "?".yellow(), msg);
                println!("Type {} for available commands", "/help".yellow());
            }
        }
        SlashResult::Continue
    }

    async fn finish(&self) {
        println!(
            "{}",
            format!("Generating {} documents, this can take a few minutes...", DocumentKind::ALL.len()).dimmed()
        );
        match self.interview.finish().await {
            Ok(bundle) => {
                println!("{}", "Your business plan is ready.".bright_green().bold());
                if bundle.bmc.is_none() {
                    println!("{} {}", "!".yellow(), "The Business Model Canvas could not be generated.".dimmed());
                }
                self.print_documents();
            }
            Err(e) => print_error(&e),
        }
    }

    async fn new_interview(&self) {
        match self.interview.reset() {
            Ok(()) => {
                println!("{}", "Starting a new interview.".dimmed());
                self.start_interview().await;
            }
            Err(e) => print_error(&e),
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:18} Show this help", "/help".yellow());
        println!("  {:18} Exit", "/quit".yellow());
        println!("  {:18} Finish the interview and generate documents", "/finish".yellow());
        println!("  {:18} Show the conversation so far", "/transcript".yellow());
        println!("  {:18} List generated documents", "/docs".yellow());
        println!("  {:18} Show one document", "/show <document>".yellow());
        println!("  {:18} Save documents as Markdown", "/export [dir]".yellow());
        println!("  {:18} Start over after the documents are ready", "/new".yellow());
        println!();
        println!("{}", "Documents:".bright_cyan());
        for kind in DocumentKind::ALL {
            println!("  {:18} {}", kind.template_name().yellow(), kind.aliases().join(", ").dimmed());
        }
        println!();
    }

    fn print_transcript(&self) {
        let transcript = self.interview.transcript();
        if transcript.is_empty() {
            println!("{}", "No conversation yet.".dimmed());
            return;
        }

        println!();
        for (i, turn) in transcript.turns().iter().enumerate() {
            println!("{:3}. {}: {}", i + 1, speaker_label(turn), turn.text());
        }
        println!();
    }

    fn print_documents(&self) {
        let Some(bundle) = self.interview.bundle() else {
            println!("{}", "No documents yet. Use /finish first.".dimmed());
            return;
        };

        println!();
        for kind in DocumentKind::ALL {
            let status = match (kind.is_structured(), &bundle.bmc) {
                (true, None) => "unavailable".yellow(),
                _ => "ready".green(),
            };
            println!("  {:24} {:32} {}", kind.template_name().yellow(), kind.title(), status);
        }
        println!();
        println!("Use {} to read one, {} to save all.", "/show <document>".yellow(), "/export".yellow());
        println!();
    }

    fn show(&self, kind: DocumentKind) {
        match self.interview.bundle() {
            Some(bundle) => {
                println!();
                println!("{}", bundle.render(kind, &self.interview.messages().canvas_unavailable));
            }
            None => println!("{}", "No documents yet. Use /finish first.".dimmed()),
        }
    }

    fn export(&self, dir: Option<&Path>) {
        let Some(bundle) = self.interview.bundle() else {
            println!("{}", "No documents yet. Use /finish first.".dimmed());
            return;
        };

        let base = dir.unwrap_or(self.export_dir.as_path());
        match bundle.export(base, &self.interview.messages().canvas_unavailable) {
            Ok(path) => println!("{} {}", "Saved to".green(), path.display()),
            Err(e) => println!("{} {:#}", "Export failed:".red(), e),
        }
    }
}

fn speaker_label(turn: &Turn) -> colored::ColoredString {
    match turn.speaker() {
        Speaker::User => turn.speaker().label().bright_green(),
        Speaker::Assistant => turn.speaker().label().bright_blue(),
    }
}

fn print_waiting() {
    print!("{}", "...".dimmed());
    let _ = io::stdout().flush();
    print!("\r");
}

fn print_exchange(exchange: &Exchange) {
    let label = speaker_label(&exchange.reply);
    if exchange.degraded {
        println!("{}: {}", label, exchange.reply.text().red());
    } else {
        println!("{}: {}", label, exchange.reply.text());
    }
    println!();
}

fn print_error(err: &InterviewError) {
    match err {
        InterviewError::GenerationFailed { message, source } => {
            println!("{} {}", "x".red(), message.red());
            println!("  {}", source.to_string().dimmed());
        }
        other => println!("{} {}", "!".yellow(), other),
    }
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}
