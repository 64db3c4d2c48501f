//! Document generators
//!
//! Nine stateless generators turn a finished transcript into business
//! documents. Eight produce Markdown through one templated call; the Business
//! Model Canvas adds a schema constraint and validation. [`DocumentGenerator::generate_all`]
//! runs all nine concurrently and commits them only if every call succeeds.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

mod error;
mod join;

pub use error::{BatchError, GenerationError};
pub use join::join_all_or_fail;

use crate::bundle::{BundleBuilder, DocumentBundle};
use crate::canvas::BusinessModelCanvas;
use crate::config::{GenerationConfig, Messages};
use crate::llm::{GenerateRequest, LlmClient, LlmError};
use crate::prompts::{PromptContext, PromptLoader};
use crate::transcript::Transcript;

/// The nine generated documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    SummaryNote,
    BusinessModelCanvas,
    OnePagePlan,
    FinancialPlan,
    StrategicPlan,
    GtmStrategy,
    MarketingPlan,
    OpsPlan,
    HrPlan,
}

impl DocumentKind {
    /// Every kind, in presentation order
    pub const ALL: [DocumentKind; 9] = [
        Self::SummaryNote,
        Self::BusinessModelCanvas,
        Self::OnePagePlan,
        Self::FinancialPlan,
        Self::StrategicPlan,
        Self::GtmStrategy,
        Self::MarketingPlan,
        Self::OpsPlan,
        Self::HrPlan,
    ];

    /// Prompt template name; also the export file stem
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::SummaryNote => "summary-note",
            Self::BusinessModelCanvas => "business-model-canvas",
            Self::OnePagePlan => "one-page-plan",
            Self::FinancialPlan => "financial-plan",
            Self::StrategicPlan => "strategic-plan",
            Self::GtmStrategy => "gtm-strategy",
            Self::MarketingPlan => "marketing-plan",
            Self::OpsPlan => "ops-plan",
            Self::HrPlan => "hr-plan",
        }
    }

    /// Human-readable document title
    pub fn title(&self) -> &'static str {
        match self {
            Self::SummaryNote => "Summary Note",
            Self::BusinessModelCanvas => "Business Model Canvas",
            Self::OnePagePlan => "One Page Business Plan",
            Self::FinancialPlan => "Financial Plan & Projections",
            Self::StrategicPlan => "Strategic Plan",
            Self::GtmStrategy => "Go-To-Market Strategy",
            Self::MarketingPlan => "1-Page Marketing Plan",
            Self::OpsPlan => "Operational Plan",
            Self::HrPlan => "HR Plan",
        }
    }

    /// Short aliases accepted on the command line
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::SummaryNote => &["summary", "note"],
            Self::BusinessModelCanvas => &["bmc", "canvas"],
            Self::OnePagePlan => &["one-page", "plan"],
            Self::FinancialPlan => &["financial", "finance"],
            Self::StrategicPlan => &["strategic", "strategy"],
            Self::GtmStrategy => &["gtm"],
            Self::MarketingPlan => &["marketing"],
            Self::OpsPlan => &["ops", "operations"],
            Self::HrPlan => &["hr"],
        }
    }

    /// True for the schema-constrained canvas
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::BusinessModelCanvas)
    }

    /// Look up a kind by template name or alias (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.template_name() == name || k.aliases().contains(&name.as_str()))
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Output of one generator
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedDocument {
    Markdown(String),
    /// `None` when the reply failed schema validation
    Canvas(Option<BusinessModelCanvas>),
}

/// Runs the templated one-shot calls for every document kind
pub struct DocumentGenerator {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    language: String,
    settings: GenerationConfig,
    messages: Messages,
}

impl DocumentGenerator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptLoader>,
        language: impl Into<String>,
        settings: GenerationConfig,
        messages: Messages,
    ) -> Self {
        Self {
            llm,
            prompts,
            language: language.into(),
            settings,
            messages,
        }
    }

    fn render_prompt(&self, kind: DocumentKind, dialogue: &str) -> Result<String, GenerationError> {
        let ctx = PromptContext::document(kind.title(), dialogue, self.language.as_str());
        self.prompts
            .render(kind.template_name(), &ctx)
            .map_err(|e| GenerationError::Prompt {
                kind,
                message: e.to_string(),
            })
    }

    /// Issue one request under the per-document timeout
    async fn call(&self, kind: DocumentKind, request: GenerateRequest) -> Result<Option<String>, GenerationError> {
        let timeout = self.settings.timeout();
        let started = Instant::now();

        let response = match tokio::time::timeout(timeout, self.llm.generate(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => {
                warn!(%kind, error = %source, "DocumentGenerator::call: request failed");
                return Err(GenerationError::Llm { kind, source });
            }
            Err(_) => {
                warn!(%kind, ?timeout, "DocumentGenerator::call: timed out");
                return Err(GenerationError::Llm {
                    kind,
                    source: LlmError::Timeout(timeout),
                });
            }
        };

        debug!(
            %kind,
            elapsed_ms = started.elapsed().as_millis() as u64,
            total_tokens = response.usage.total(),
            finish_reason = ?response.finish_reason,
            "DocumentGenerator::call: completed"
        );
        Ok(response.non_empty_text().map(str::to_string))
    }

    fn fallback_text(&self, kind: DocumentKind) -> String {
        match kind {
            DocumentKind::SummaryNote => self.messages.summary_unavailable.clone(),
            _ => self.messages.document_unavailable.clone(),
        }
    }

    async fn markdown_from_dialogue(&self, kind: DocumentKind, dialogue: &str) -> Result<String, GenerationError> {
        debug!(%kind, "DocumentGenerator::markdown_from_dialogue: called");
        let prompt = self.render_prompt(kind, dialogue)?;
        let request = GenerateRequest::text(prompt, self.settings.max_tokens);

        match self.call(kind, request).await? {
            Some(text) => Ok(text),
            None => {
                warn!(%kind, "DocumentGenerator::markdown_from_dialogue: empty response, using fallback");
                Ok(self.fallback_text(kind))
            }
        }
    }

    async fn canvas_from_dialogue(&self, dialogue: &str) -> Result<Option<BusinessModelCanvas>, GenerationError> {
        let kind = DocumentKind::BusinessModelCanvas;
        debug!("DocumentGenerator::canvas_from_dialogue: called");
        let prompt = self.render_prompt(kind, dialogue)?;
        let request = GenerateRequest::json(
            prompt,
            BusinessModelCanvas::SCHEMA_NAME,
            BusinessModelCanvas::schema(),
            self.settings.max_tokens,
        );

        let canvas = self
            .call(kind, request)
            .await?
            .and_then(|text| BusinessModelCanvas::parse(&text));
        if canvas.is_none() {
            warn!("DocumentGenerator::canvas_from_dialogue: no valid canvas in response");
        }
        Ok(canvas)
    }

    /// Generate one Markdown document
    ///
    /// An empty reply becomes the localized fallback text.
    pub async fn generate_markdown(&self, kind: DocumentKind, transcript: &Transcript) -> Result<String, GenerationError> {
        self.markdown_from_dialogue(kind, &transcript.render_dialogue()).await
    }

    /// Generate the Business Model Canvas
    ///
    /// `Ok(None)` means the service answered but the reply was not a valid
    /// canvas; only transport and prompt failures are errors.
    pub async fn generate_canvas(&self, transcript: &Transcript) -> Result<Option<BusinessModelCanvas>, GenerationError> {
        self.canvas_from_dialogue(&transcript.render_dialogue()).await
    }

    async fn generate_from_dialogue(
        &self,
        kind: DocumentKind,
        dialogue: &str,
    ) -> Result<GeneratedDocument, GenerationError> {
        if kind.is_structured() {
            self.canvas_from_dialogue(dialogue).await.map(GeneratedDocument::Canvas)
        } else {
            self.markdown_from_dialogue(kind, dialogue)
                .await
                .map(GeneratedDocument::Markdown)
        }
    }

    /// Generate any single document
    pub async fn generate(&self, kind: DocumentKind, transcript: &Transcript) -> Result<GeneratedDocument, GenerationError> {
        self.generate_from_dialogue(kind, &transcript.render_dialogue()).await
    }

    /// Generate all nine documents concurrently
    ///
    /// Either every generator succeeds and a complete bundle is returned, or
    /// nothing is kept and the error lists each failed document.
    pub async fn generate_all(&self, transcript: &Transcript) -> Result<DocumentBundle, BatchError> {
        let dialogue = transcript.render_dialogue();
        info!(turns = transcript.len(), "Generating {} documents", DocumentKind::ALL.len());
        let started = Instant::now();

        let tasks = DocumentKind::ALL
            .into_iter()
            .map(|kind| (kind, self.generate_from_dialogue(kind, &dialogue)));

        let documents = join_all_or_fail(tasks).await.map_err(|failures| {
            let err = BatchError {
                failures: failures.into_iter().map(|(_, e)| e).collect(),
            };
            warn!(error = %err, "DocumentGenerator::generate_all: batch failed");
            err
        })?;

        let mut builder = BundleBuilder::default();
        for (kind, document) in documents {
            builder.insert(kind, document);
        }
        let bundle = builder.build().map_err(|missing| BatchError {
            failures: missing
                .into_iter()
                .map(|kind| GenerationError::Llm {
                    kind,
                    source: LlmError::InvalidResponse("no output produced".to_string()),
                })
                .collect(),
        })?;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            canvas = bundle.bmc.is_some(),
            "Generated all documents"
        );
        Ok(bundle)
    }
}
