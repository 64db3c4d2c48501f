//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for the interviewer and
//! the nine document generators.
//!
//! Template loading chain:
//! 1. `prompts.dir` from config (user override)
//! 2. `.bizplan/prompts/{name}.pmt` (project override)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution, with HTML
//! escaping disabled.

pub mod embedded;
mod loader;

pub use loader::{PromptContext, PromptLoader, TemplateSource};
