//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Interview system instruction
pub const INTERVIEWER: &str = include_str!("../../prompts/interviewer.pmt");

pub const SUMMARY_NOTE: &str = include_str!("../../prompts/summary-note.pmt");
pub const BUSINESS_MODEL_CANVAS: &str = include_str!("../../prompts/business-model-canvas.pmt");
pub const ONE_PAGE_PLAN: &str = include_str!("../../prompts/one-page-plan.pmt");
pub const FINANCIAL_PLAN: &str = include_str!("../../prompts/financial-plan.pmt");
pub const STRATEGIC_PLAN: &str = include_str!("../../prompts/strategic-plan.pmt");
pub const GTM_STRATEGY: &str = include_str!("../../prompts/gtm-strategy.pmt");
pub const MARKETING_PLAN: &str = include_str!("../../prompts/marketing-plan.pmt");
pub const OPS_PLAN: &str = include_str!("../../prompts/ops-plan.pmt");
pub const HR_PLAN: &str = include_str!("../../prompts/hr-plan.pmt");

/// Names of every embedded template
pub const NAMES: [&str; 10] = [
    "interviewer",
    "summary-note",
    "business-model-canvas",
    "one-page-plan",
    "financial-plan",
    "strategic-plan",
    "gtm-strategy",
    "marketing-plan",
    "ops-plan",
    "hr-plan",
];

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    let found = match name {
        "interviewer" => Some(INTERVIEWER),
        "summary-note" => Some(SUMMARY_NOTE),
        "business-model-canvas" => Some(BUSINESS_MODEL_CANVAS),
        "one-page-plan" => Some(ONE_PAGE_PLAN),
        "financial-plan" => Some(FINANCIAL_PLAN),
        "strategic-plan" => Some(STRATEGIC_PLAN),
        "gtm-strategy" => Some(GTM_STRATEGY),
        "marketing-plan" => Some(MARKETING_PLAN),
        "ops-plan" => Some(OPS_PLAN),
        "hr-plan" => Some(HR_PLAN),
        _ => None,
    };
    if found.is_none() {
        debug!(%name, "get_embedded: no match found");
    }
    found
}
