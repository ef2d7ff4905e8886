//! Structured verdict parsing
//!
//! The model is instructed to reply with a JSON object, but replies from
//! a degraded or chatty model are untrusted input. Rather than poking at
//! loosely-typed fields, the reply is parsed into a sum type: either a
//! structured verdict or a parse failure carrying the raw text.

use serde::Deserialize;

/// A successfully parsed review verdict
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewVerdict {
    /// Whether the model judged the submission correct
    pub is_correct: bool,
    /// Raw confidence as reported, if the model included one.
    /// Not yet clamped; missing confidence is kept distinct from 0.0.
    pub confidence: Option<f64>,
    /// Free-text explanation, if any
    pub explanation: Option<String>,
}

/// Outcome of parsing a model reply
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The reply contained a usable structured verdict
    Parsed(ReviewVerdict),
    /// The reply could not be interpreted; the raw text is kept for logs
    Unparseable { raw: String },
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    is_correct: bool,
    confidence: Option<f64>,
    explanation: Option<String>,
}

/// Parse a model reply into a verdict.
///
/// Tolerates a JSON object wrapped in a code fence or surrounded by
/// prose, as long as one object with an `is_correct` field is present.
pub fn parse_verdict(content: &str) -> Verdict {
    let candidate = json_body(content);

    match serde_json::from_str::<RawVerdict>(candidate) {
        Ok(raw) => Verdict::Parsed(ReviewVerdict {
            is_correct: raw.is_correct,
            confidence: raw.confidence.filter(|c| c.is_finite()),
            explanation: raw.explanation,
        }),
        Err(_) => Verdict::Unparseable {
            raw: content.to_string(),
        },
    }
}

/// Clamp a reported confidence into [0, 1].
///
/// NaN clamps to 0. Idempotent: clamping a clamped value is a no-op.
pub fn clamp_confidence(value: f64) -> f64 {
    value.max(0.0).min(1.0)
}

/// Slice out the outermost `{ ... }` of a reply, if any
fn json_body(content: &str) -> &str {
    let trimmed = content.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
