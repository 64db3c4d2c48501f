//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;

/// Context for rendering prompt templates
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptContext {
    /// Rendered dialogue (empty for the interviewer)
    pub transcript: String,
    /// Output language
    pub language: String,
    /// Human title of the document being generated
    pub title: String,
}

impl PromptContext {
    /// Context for the interviewer system instruction
    pub fn interview(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Default::default()
        }
    }

    /// Context for one document generator
    pub fn document(title: impl Into<String>, transcript: impl Into<String>, language: impl Into<String>) -> Self {
        let ctx = Self {
            transcript: transcript.into(),
            language: language.into(),
            title: title.into(),
        };
        debug!(title = %ctx.title, transcript_len = ctx.transcript.len(), "PromptContext::document: called");
        ctx
    }
}

/// Where a template was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    File(PathBuf),
    Embedded,
}

impl std::fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Embedded => write!(f, "embedded"),
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Override directories, checked in order
    dirs: Vec<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that checks the configured directory, then
    /// `.bizplan/prompts/` under `worktree`, then the embedded defaults
    pub fn new(configured_dir: Option<&Path>, worktree: impl AsRef<Path>) -> Self {
        let worktree = worktree.as_ref();
        debug!(?configured_dir, ?worktree, "PromptLoader::new: called");

        let candidates = configured_dir
            .map(Path::to_path_buf)
            .into_iter()
            .chain(std::iter::once(worktree.join(".bizplan/prompts")));

        let dirs = candidates
            .filter(|dir| {
                let exists = dir.is_dir();
                debug!(?dir, %exists, "PromptLoader::new: checking directory");
                exists
            })
            .collect();

        Self {
            hbs: Self::engine(),
            dirs,
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            dirs: Vec::new(),
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text; transcripts must reach the model verbatim
        hbs.register_escape_fn(handlebars::no_escape);
        hbs.set_strict_mode(true);
        hbs
    }

    /// Find where a template would be loaded from
    pub fn locate(&self, name: &str) -> Option<TemplateSource> {
        debug!(%name, "PromptLoader::locate: called");
        for dir in &self.dirs {
            let path = dir.join(format!("{}.pmt", name));
            if path.is_file() {
                debug!(?path, "PromptLoader::locate: found override");
                return Some(TemplateSource::File(path));
            }
        }
        embedded::get_embedded(name).map(|_| TemplateSource::Embedded)
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Configured `prompts.dir`
    /// 2. `.bizplan/prompts/{name}.pmt`
    /// 3. Embedded fallback
    pub fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        match self.locate(name) {
            Some(TemplateSource::File(path)) => std::fs::read_to_string(&path)
                .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e)),
            Some(TemplateSource::Embedded) => embedded::get_embedded(name)
                .map(str::to_string)
                .ok_or_else(|| eyre!("Prompt template not found: {}", name)),
            None => {
                debug!(%name, "PromptLoader::load_template: not found anywhere");
                Err(eyre!("Prompt template not found: {}", name))
            }
        }
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &PromptContext) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_document_does_not_escape() {
        let loader = PromptLoader::embedded_only();
        let ctx = PromptContext::document(
            "Strategic Plan",
            "User: Tom & Jerry's <cafe> \"quotes\"",
            "English",
        );

        let prompt = loader.render("strategic-plan", &ctx).unwrap();
        assert!(prompt.contains("User: Tom & Jerry's <cafe> \"quotes\""));
        assert!(prompt.contains("Document: Strategic Plan"));
        assert!(prompt.contains("in English"));
    }

    #[test]
    fn test_render_interviewer() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader.render("interviewer", &PromptContext::interview("Burmese")).unwrap();
        assert!(prompt.contains("speaking Burmese"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
        assert!(loader.locate("nonexistent-template").is_none());
    }

    #[test]
    fn test_override_directory_wins() {
        let worktree = tempfile::tempdir().unwrap();
        let dir = worktree.path().join(".bizplan/prompts");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("hr-plan.pmt"), "Custom {{title}} for {{transcript}}").unwrap();

        let loader = PromptLoader::new(None, worktree.path());
        assert_eq!(
            loader.locate("hr-plan"),
            Some(TemplateSource::File(dir.join("hr-plan.pmt")))
        );
        assert_eq!(loader.locate("ops-plan"), Some(TemplateSource::Embedded));

        let ctx = PromptContext::document("HR Plan", "User: hi", "English");
        assert_eq!(loader.render("hr-plan", &ctx).unwrap(), "Custom HR Plan for User: hi");
    }

    #[test]
    fn test_configured_dir_before_worktree() {
        let worktree = tempfile::tempdir().unwrap();
        let local = worktree.path().join(".bizplan/prompts");
        std::fs::create_dir_all(&local).unwrap();
        std::fs::write(local.join("summary-note.pmt"), "local").unwrap();

        let configured = tempfile::tempdir().unwrap();
        std::fs::write(configured.path().join("summary-note.pmt"), "configured").unwrap();

        let loader = PromptLoader::new(Some(configured.path()), worktree.path());
        assert_eq!(loader.load_template("summary-note").unwrap(), "configured");
    }

    #[test]
    fn test_strict_mode_rejects_unknown_variable() {
        let worktree = tempfile::tempdir().unwrap();
        let dir = worktree.path().join(".bizplan/prompts");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("gtm-strategy.pmt"), "{{missing_variable}}").unwrap();

        let loader = PromptLoader::new(None, worktree.path());
        let ctx = PromptContext::document("Go-To-Market Strategy", "", "English");
        assert!(loader.render("gtm-strategy", &ctx).is_err());
    }
}
