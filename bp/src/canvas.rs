//! Business Model Canvas
//!
//! The one structured document. The service is asked for JSON matching
//! [`BusinessModelCanvas::schema`]; the reply is untrusted text that must
//! parse with all nine slots present or it is discarded.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Nine-slot strategic summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessModelCanvas {
    pub key_partners: Vec<String>,
    pub key_activities: Vec<String>,
    pub key_resources: Vec<String>,
    pub value_propositions: Vec<String>,
    pub customer_relationships: Vec<String>,
    pub channels: Vec<String>,
    pub customer_segments: Vec<String>,
    pub cost_structure: Vec<String>,
    pub revenue_streams: Vec<String>,
}

/// Wire names of the nine slots, in canvas reading order
pub const FIELDS: [&str; 9] = [
    "keyPartners",
    "keyActivities",
    "keyResources",
    "valuePropositions",
    "customerRelationships",
    "channels",
    "customerSegments",
    "costStructure",
    "revenueStreams",
];

impl BusinessModelCanvas {
    /// Schema name sent alongside [`Self::schema`]
    pub const SCHEMA_NAME: &'static str = "business_model_canvas";

    /// JSON schema handed to the service for constrained output
    pub fn schema() -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = FIELDS
            .iter()
            .map(|name| {
                (
                    (*name).to_string(),
                    serde_json::json!({
                        "type": "array",
                        "items": { "type": "string" },
                    }),
                )
            })
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": FIELDS,
        })
    }

    /// Parse a service reply
    ///
    /// Returns `None` unless the text is a JSON object carrying all nine
    /// slots as arrays of strings. A surrounding Markdown code fence is
    /// tolerated.
    pub fn parse(text: &str) -> Option<Self> {
        debug!(text_len = text.len(), "BusinessModelCanvas::parse: called");
        let body = strip_code_fence(text);
        if body.is_empty() {
            debug!("BusinessModelCanvas::parse: empty body");
            return None;
        }

        match serde_json::from_str::<Self>(body) {
            Ok(canvas) => Some(canvas),
            Err(e) => {
                warn!(error = %e, "BusinessModelCanvas::parse: invalid canvas JSON");
                None
            }
        }
    }

    /// Slots paired with their display headings, in canvas reading order
    pub fn sections(&self) -> [(&'static str, &[String]); 9] {
        [
            ("Key Partners", &self.key_partners),
            ("Key Activities", &self.key_activities),
            ("Key Resources", &self.key_resources),
            ("Value Propositions", &self.value_propositions),
            ("Customer Relationships", &self.customer_relationships),
            ("Channels", &self.channels),
            ("Customer Segments", &self.customer_segments),
            ("Cost Structure", &self.cost_structure),
            ("Revenue Streams", &self.revenue_streams),
        ]
    }

    /// Render as Markdown with one heading per slot
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for (heading, items) in self.sections() {
            out.push_str(&format!("## {}\n\n", heading));
            if items.is_empty() {
                out.push_str("- (none)\n");
            }
            for item in items {
                out.push_str(&format!("- {}\n", item));
            }
            out.push('\n');
        }
        out.trim_end().to_string()
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "keyPartners": ["Local farmers"],
        "keyActivities": ["Baking"],
        "keyResources": ["Oven"],
        "valuePropositions": ["Fresh bread daily"],
        "customerRelationships": ["Loyalty card"],
        "channels": ["Shop front", "Facebook"],
        "customerSegments": ["Office workers"],
        "costStructure": ["Flour", "Rent"],
        "revenueStreams": ["Retail sales"]
    }"#;

    #[test]
    fn test_parse_valid() {
        let canvas = BusinessModelCanvas::parse(VALID).unwrap();
        assert_eq!(canvas.channels, vec!["Shop front", "Facebook"]);
        assert_eq!(canvas.key_partners, vec!["Local farmers"]);
    }

    #[test]
    fn test_parse_fenced() {
        let fenced = format!("```json\n{}\n```", VALID);
        assert!(BusinessModelCanvas::parse(&fenced).is_some());

        let bare_fence = format!("```\n{}\n```\n", VALID);
        assert!(BusinessModelCanvas::parse(&bare_fence).is_some());
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        for field in FIELDS {
            let mut value: serde_json::Value = serde_json::from_str(VALID).unwrap();
            value.as_object_mut().unwrap().remove(field);
            let text = value.to_string();
            assert!(BusinessModelCanvas::parse(&text).is_none(), "accepted canvas without {field}");
        }
    }

    #[test]
    fn test_parse_rejects_wrong_item_type() {
        let text = VALID.replace(r#"["Baking"]"#, "[1, 2]");
        assert!(BusinessModelCanvas::parse(&text).is_none());

        let text = VALID.replace(r#"["Oven"]"#, r#""Oven""#);
        assert!(BusinessModelCanvas::parse(&text).is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(BusinessModelCanvas::parse("").is_none());
        assert!(BusinessModelCanvas::parse("not json").is_none());
        assert!(BusinessModelCanvas::parse("{\"keyPartners\": [").is_none());
        assert!(BusinessModelCanvas::parse("[]").is_none());
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let text = VALID.replacen('{', r#"{"notes": "extra","#, 1);
        assert!(BusinessModelCanvas::parse(&text).is_some());
    }

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = BusinessModelCanvas::schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"].as_array().unwrap().len(), 9);
        for field in FIELDS {
            assert_eq!(schema["properties"][field]["items"]["type"], "string");
        }
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(BusinessModelCanvas::default()).unwrap();
        for field in FIELDS {
            assert!(json.get(field).is_some(), "missing {field}");
        }
    }

    #[test]
    fn test_to_markdown() {
        let canvas = BusinessModelCanvas::parse(VALID).unwrap();
        let md = canvas.to_markdown();
        assert!(md.starts_with("## Key Partners\n\n- Local farmers"));
        assert!(md.contains("## Revenue Streams\n\n- Retail sales"));

        let empty = BusinessModelCanvas::default().to_markdown();
        assert!(empty.contains("## Channels\n\n- (none)"));
    }
}
