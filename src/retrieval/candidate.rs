//! Candidate normalization at the retrieval boundary.
//!
//! Vector backends disagree about hit shapes: some return positional
//! triples, some qdrant-style objects, some garbage. [`Candidate::normalize`]
//! is the single total function that turns any of them into the canonical
//! `(chunk_id, payload, score)` form. It never fails; unusable input
//! becomes the `"unknown"` candidate, which downstream stages skip.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder id for candidates with no usable identifier.
pub const UNKNOWN_ID: &str = "unknown";

/// Canonical retrieval candidate, request-scoped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub chunk_id: String,
    pub payload: Map<String, Value>,
    pub score: f32,
}

impl Candidate {
    /// The placeholder candidate: `("unknown", {}, 0.0)`.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            chunk_id: UNKNOWN_ID.to_string(),
            payload: Map::new(),
            score: 0.0,
        }
    }

    /// Total normalization of an arbitrary JSON value.
    ///
    /// - Arrays of three or more elements are positional
    ///   `[chunk_id, payload, score]` triples.
    /// - Objects are searched for `id`, `chunk_id`, `point_id`, `uuid` (in
    ///   that order, skipping falsy values: null, `false`, zero, empty
    ///   strings and containers), plus `payload` and `score`.
    /// - Everything else normalizes to [`Candidate::unknown`].
    #[must_use]
    pub fn normalize(raw: &Value) -> Self {
        match raw {
            Value::Array(items) if items.len() >= 3 => Self {
                chunk_id: stringify(&items[0]),
                payload: items[1].as_object().cloned().unwrap_or_default(),
                score: score_of(&items[2]),
            },
            Value::Object(map) => {
                let chunk_id = ["id", "chunk_id", "point_id", "uuid"]
                    .iter()
                    .find_map(|key| map.get(*key).filter(|v| usable_id(v)))
                    .map_or_else(|| UNKNOWN_ID.to_string(), stringify);
                Self {
                    chunk_id,
                    payload: map
                        .get("payload")
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default(),
                    score: map.get("score").map_or(0.0, score_of),
                }
            }
            _ => Self::unknown(),
        }
    }

    /// True when the candidate carries a real chunk id.
    #[must_use]
    pub fn has_chunk_id(&self) -> bool {
        !self.chunk_id.is_empty() && self.chunk_id != UNKNOWN_ID
    }
}

/// Falsy id values are skipped during the key search.
fn usable_id(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn score_of(value: &Value) -> f32 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0) as f32,
        Value::String(s) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
