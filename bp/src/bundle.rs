//! Document bundle
//!
//! The nine generated documents for one transcript. A bundle only exists
//! when every generator succeeded; [`BundleBuilder::build`] refuses to
//! produce a partial one.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::canvas::BusinessModelCanvas;
use crate::generate::{DocumentKind, GeneratedDocument};

/// All nine generated documents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentBundle {
    pub summary_note: String,
    /// `None` when the canvas reply failed validation
    pub bmc: Option<BusinessModelCanvas>,
    pub one_page_plan: String,
    pub financial_plan: String,
    pub strategic_plan: String,
    pub gtm_strategy: String,
    pub marketing_plan: String,
    pub ops_plan: String,
    pub hr_plan: String,
}

impl DocumentBundle {
    /// Markdown body of a prose document; `None` for the canvas
    pub fn markdown(&self, kind: DocumentKind) -> Option<&str> {
        let text = match kind {
            DocumentKind::SummaryNote => &self.summary_note,
            DocumentKind::BusinessModelCanvas => return None,
            DocumentKind::OnePagePlan => &self.one_page_plan,
            DocumentKind::FinancialPlan => &self.financial_plan,
            DocumentKind::StrategicPlan => &self.strategic_plan,
            DocumentKind::GtmStrategy => &self.gtm_strategy,
            DocumentKind::MarketingPlan => &self.marketing_plan,
            DocumentKind::OpsPlan => &self.ops_plan,
            DocumentKind::HrPlan => &self.hr_plan,
        };
        Some(text.as_str())
    }

    /// Render one document as a titled Markdown page
    ///
    /// A missing canvas renders as `canvas_placeholder`.
    pub fn render(&self, kind: DocumentKind, canvas_placeholder: &str) -> String {
        let body = match (kind, &self.bmc) {
            (DocumentKind::BusinessModelCanvas, Some(canvas)) => canvas.to_markdown(),
            (DocumentKind::BusinessModelCanvas, None) => canvas_placeholder.to_string(),
            _ => self.markdown(kind).unwrap_or_default().to_string(),
        };
        format!("# {}\n\n{}\n", kind.title(), body.trim_end())
    }

    /// Write every document into a new timestamped directory under `base_dir`
    ///
    /// Returns the directory created.
    pub fn export(&self, base_dir: &Path, canvas_placeholder: &str) -> Result<PathBuf> {
        debug!(?base_dir, "DocumentBundle::export: called");
        let stamp = chrono::Local::now().format("%Y-%m-%d-%H%M%S").to_string();
        let dir = unique_dir(base_dir, &stamp);
        fs::create_dir_all(&dir).context(format!("Failed to create export directory {}", dir.display()))?;

        for (idx, kind) in DocumentKind::ALL.into_iter().enumerate() {
            let path = dir.join(format!("{:02}-{}.md", idx + 1, kind.template_name()));
            fs::write(&path, self.render(kind, canvas_placeholder))
                .context(format!("Failed to write {}", path.display()))?;
        }

        if let Some(canvas) = &self.bmc {
            let path = dir.join("business-model-canvas.json");
            let json = serde_json::to_string_pretty(canvas).context("Failed to serialize canvas")?;
            fs::write(&path, json).context(format!("Failed to write {}", path.display()))?;
        }

        info!("Exported documents to {}", dir.display());
        Ok(dir)
    }
}

fn unique_dir(base_dir: &Path, stamp: &str) -> PathBuf {
    let first = base_dir.join(stamp);
    if !first.exists() {
        return first;
    }
    (2..)
        .map(|n| base_dir.join(format!("{}-{}", stamp, n)))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

/// Collects generator outputs until all nine are present
#[derive(Debug, Default)]
pub struct BundleBuilder {
    markdown: HashMap<DocumentKind, String>,
    canvas: Option<Option<BusinessModelCanvas>>,
}

impl BundleBuilder {
    pub fn insert(&mut self, kind: DocumentKind, document: GeneratedDocument) {
        match document {
            GeneratedDocument::Markdown(text) => {
                self.markdown.insert(kind, text);
            }
            GeneratedDocument::Canvas(canvas) => {
                self.canvas = Some(canvas);
            }
        }
    }

    /// Build the bundle, or return the kinds still missing
    pub fn build(mut self) -> std::result::Result<DocumentBundle, Vec<DocumentKind>> {
        let missing: Vec<DocumentKind> = DocumentKind::ALL
            .into_iter()
            .filter(|kind| {
                if kind.is_structured() {
                    self.canvas.is_none()
                } else {
                    !self.markdown.contains_key(kind)
                }
            })
            .collect();
        if !missing.is_empty() {
            debug!(?missing, "BundleBuilder::build: incomplete");
            return Err(missing);
        }

        let mut take = |kind: DocumentKind| self.markdown.remove(&kind).unwrap_or_default();
        Ok(DocumentBundle {
            summary_note: take(DocumentKind::SummaryNote),
            one_page_plan: take(DocumentKind::OnePagePlan),
            financial_plan: take(DocumentKind::FinancialPlan),
            strategic_plan: take(DocumentKind::StrategicPlan),
            gtm_strategy: take(DocumentKind::GtmStrategy),
            marketing_plan: take(DocumentKind::MarketingPlan),
            ops_plan: take(DocumentKind::OpsPlan),
            hr_plan: take(DocumentKind::HrPlan),
            bmc: self.canvas.flatten(),
        })
    }
}
