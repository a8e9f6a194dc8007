use serde_json::{Map, Value};

/// How many times a JSON-encoded string is decoded before it is kept as text.
const MAX_DECODE_DEPTH: usize = 4;

/// Upstream response after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    Object(Map<String, Value>),
    Array(Vec<Value>),
    Text(String),
}

impl RawPayload {
    /// Classify a raw HTTP body. Returns `None` when the body is absent.
    pub fn from_body(body: &str) -> Option<Self> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => Self::classify(value),
            Err(_) => Some(Self::Text(body.to_string())),
        }
    }

    /// Classify a decoded JSON value. `null` and `[]` are absent.
    pub fn classify(value: Value) -> Option<Self> {
        classify_at(value, 0)
    }

    /// The object used for shape matching: the payload itself, or the first
    /// element of an array.
    pub fn candidate(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            Self::Array(items) => items.first().and_then(Value::as_object),
            Self::Text(_) => None,
        }
    }

    /// Text for free-text extraction. Structured payloads contribute every
    /// string leaf, separated by blank lines.
    pub fn text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Object(map) => {
                let mut parts = Vec::new();
                for value in map.values() {
                    collect_strings(value, &mut parts);
                }
                parts.join("\n\n")
            }
            Self::Array(items) => {
                let mut parts = Vec::new();
                for value in items {
                    collect_strings(value, &mut parts);
                }
                parts.join("\n\n")
            }
        }
    }
}

fn classify_at(value: Value, depth: usize) -> Option<RawPayload> {
    match value {
        Value::Null => None,
        Value::Object(map) => Some(RawPayload::Object(map)),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(RawPayload::Array(items)),
        Value::String(s) => {
            if depth < MAX_DECODE_DEPTH && looks_like_json(&s) {
                if let Some(inner) = serde_json::from_str::<Value>(s.trim())
                    .ok()
                    .and_then(|v| classify_at(v, depth + 1))
                {
                    return Some(inner);
                }
            }
            Some(RawPayload::Text(s))
        }
        Value::Bool(b) => Some(RawPayload::Text(b.to_string())),
        Value::Number(n) => Some(RawPayload::Text(n.to_string())),
    }
}

fn looks_like_json(s: &str) -> bool {
    let t = s.trim();
    (t.starts_with('{') && t.ends_with('}')) || (t.starts_with('[') && t.ends_with(']'))
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) if !s.trim().is_empty() => out.push(s),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}
