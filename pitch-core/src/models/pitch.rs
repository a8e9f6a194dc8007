use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire names of the seven required content fields, in display order.
pub const CONTENT_FIELDS: [&str; 7] = [
    "title",
    "description",
    "problem",
    "solution",
    "targetMarket",
    "revenueModel",
    "callToAction",
];

/// Default for any field the normalizer could not find.
pub const NOT_SPECIFIED: &str = "Not specified";

/// The generated pitch body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchContent {
    pub title: String,
    pub description: String,
    pub problem: String,
    pub solution: String,
    pub target_market: String,
    pub revenue_model: String,
    pub call_to_action: String,
}

impl PitchContent {
    /// Build from a JSON object only if all seven fields are non-empty strings.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        value.as_object().and_then(Self::from_map)
    }

    /// Same check as [`PitchContent::from_value`] over an already-borrowed map.
    pub fn from_map(obj: &serde_json::Map<String, serde_json::Value>) -> Option<Self> {
        let [title, description, problem, solution, target_market, revenue_model, call_to_action] =
            CONTENT_FIELDS.map(|name| {
                obj.get(name)
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_string)
            });

        Some(Self {
            title: title?,
            description: description?,
            problem: problem?,
            solution: solution?,
            target_market: target_market?,
            revenue_model: revenue_model?,
            call_to_action: call_to_action?,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.fields().iter().all(|f| !f.trim().is_empty())
    }

    /// Field values in `CONTENT_FIELDS` order.
    pub fn fields(&self) -> [&str; 7] {
        [
            self.title.as_str(),
            self.description.as_str(),
            self.problem.as_str(),
            self.solution.as_str(),
            self.target_market.as_str(),
            self.revenue_model.as_str(),
            self.call_to_action.as_str(),
        ]
    }

    /// Placeholder content used when the upstream returned no usable text.
    pub fn placeholder(idea: &str) -> Self {
        let idea = idea.trim();
        Self {
            title: "Generated Pitch".to_string(),
            description: format!("Here's a pitch for: {}", idea),
            problem: format!("The problem that {} solves...", idea),
            solution: format!("How {} provides value...", idea),
            target_market: "Your target customers...".to_string(),
            revenue_model: "How this will make money...".to_string(),
            call_to_action: "What you want the user to do next...".to_string(),
        }
    }
}

/// A persisted pitch. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub idea: String,
    pub content: PitchContent,
    pub created_at: DateTime<Utc>,
}
