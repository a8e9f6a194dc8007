//! Response normalizer: coerces an upstream generation payload into a
//! complete `PitchContent`.
//!
//! Strategies run in a fixed order and the first match wins:
//! 1. direct shape match (all seven fields present)
//! 2. aliased keys (`summary`, `issue`, `cta`, ...)
//! 3. nested `output` unwrap (object or JSON-encoded string)
//! 4. free-text extraction
//!
//! If no text is left to extract from, the result is a placeholder built from
//! the idea. Normalization never fails for a classified payload.

mod payload;
mod text;

use serde_json::{Map, Value};

use crate::models::{PitchContent, NOT_SPECIFIED};

pub use payload::RawPayload;

type Strategy = fn(&RawPayload) -> Option<PitchContent>;

const STRATEGIES: [(&str, Strategy); 4] = [
    ("direct", direct_match),
    ("aliased", aliased_match),
    ("nested-output", nested_output),
    ("free-text", free_text),
];

/// Canonical field keys followed by accepted aliases, in `CONTENT_FIELDS` order.
const FIELD_KEYS: [&[&str]; 7] = [
    &["title"],
    &["description", "summary"],
    &["problem", "issue"],
    &["solution", "answer"],
    &["targetMarket", "target_market", "market"],
    &["revenueModel", "revenue_model", "businessModel", "business_model"],
    &["callToAction", "call_to_action", "cta"],
];

const OUTPUT_KEY: &str = "output";
const WRAPPER_KEYS: [&str; 4] = ["response", "data", "json", "result"];
const MAX_UNWRAP_DEPTH: usize = 3;

/// Normalize a classified payload. `fallback_idea` seeds the placeholder used
/// when the payload carries no text at all.
pub fn normalize(raw: &RawPayload, fallback_idea: &str) -> PitchContent {
    for (name, strategy) in STRATEGIES {
        if let Some(content) = strategy(raw) {
            tracing::debug!(strategy = name, "Normalized generation payload");
            return content;
        }
    }
    tracing::warn!("Generation payload had no usable text, using placeholder pitch");
    PitchContent::placeholder(fallback_idea)
}

fn direct_match(raw: &RawPayload) -> Option<PitchContent> {
    raw.candidate().and_then(PitchContent::from_map)
}

fn aliased_match(raw: &RawPayload) -> Option<PitchContent> {
    aliased_fields(raw.candidate()?)
}

fn nested_output(raw: &RawPayload) -> Option<PitchContent> {
    unwrap_output(raw, 0)
}

fn free_text(raw: &RawPayload) -> Option<PitchContent> {
    text::extract(&raw.text())
}

fn aliased_fields(obj: &Map<String, Value>) -> Option<PitchContent> {
    let found = FIELD_KEYS.map(|keys| {
        keys.iter().find_map(|key| {
            obj.get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        })
    });
    if found.iter().all(Option::is_none) {
        return None;
    }

    let [title, description, problem, solution, target_market, revenue_model, call_to_action] =
        found.map(|v| v.unwrap_or_else(|| NOT_SPECIFIED.to_string()));
    Some(PitchContent {
        title,
        description,
        problem,
        solution,
        target_market,
        revenue_model,
        call_to_action,
    })
}

fn find_output(obj: &Map<String, Value>) -> Option<&Value> {
    obj.get(OUTPUT_KEY).or_else(|| {
        WRAPPER_KEYS
            .iter()
            .filter_map(|key| obj.get(*key).and_then(Value::as_object))
            .find_map(|wrapper| wrapper.get(OUTPUT_KEY))
    })
}

fn unwrap_output(raw: &RawPayload, depth: usize) -> Option<PitchContent> {
    if depth >= MAX_UNWRAP_DEPTH {
        return None;
    }
    let output = find_output(raw.candidate()?)?;

    match output {
        Value::String(s) => match RawPayload::classify(output.clone()) {
            Some(inner @ (RawPayload::Object(_) | RawPayload::Array(_))) => {
                structured_match(&inner, depth + 1).or_else(|| text::extract(s))
            }
            _ => text::extract(s),
        },
        other => RawPayload::classify(other.clone())
            .and_then(|inner| structured_match(&inner, depth + 1)),
    }
}

fn structured_match(raw: &RawPayload, depth: usize) -> Option<PitchContent> {
    direct_match(raw)
        .or_else(|| aliased_match(raw))
        .or_else(|| unwrap_output(raw, depth))
}
