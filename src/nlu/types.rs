//! Common types for NLU queries

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label reserved by NLU services for "nothing recognized"
pub const NO_INTENT_LABEL: &str = "None";

/// Intent reported by an NLU service
///
/// The "nothing recognized" sentinel is its own variant so a real intent can
/// never be confused with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum Intent {
    NoIntent,
    Named(String),
}

impl Intent {
    pub fn named(name: impl Into<String>) -> Self {
        Intent::Named(name.into())
    }

    /// Map a raw service label, treating the sentinel label as [`Intent::NoIntent`]
    pub fn from_label(label: &str) -> Self {
        if label == NO_INTENT_LABEL {
            Intent::NoIntent
        } else {
            Intent::Named(label.to_string())
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Intent::NoIntent => None,
            Intent::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::NoIntent => f.write_str(NO_INTENT_LABEL),
            Intent::Named(name) => f.write_str(name),
        }
    }
}

/// Intent with its confidence score in `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentScore {
    pub intent: Intent,
    pub score: f64,
}

impl IntentScore {
    pub fn new(intent: Intent, score: f64) -> Self {
        Self { intent, score }
    }
}

/// Entity annotation attached to a query result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityAnnotation {
    pub entity: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<usize>,
}

impl EntityAnnotation {
    pub fn new(entity: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            kind: kind.into(),
            score: None,
            start_index: None,
            end_index: None,
        }
    }
}

/// Result of one NLU query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NluResult {
    pub query: String,
    #[serde(default)]
    pub entities: Vec<EntityAnnotation>,
    pub top_intent: IntentScore,
}

impl NluResult {
    pub fn new(query: impl Into<String>, top_intent: IntentScore) -> Self {
        Self {
            query: query.into(),
            entities: Vec::new(),
            top_intent,
        }
    }

    #[must_use]
    pub fn with_entities(mut self, entities: Vec<EntityAnnotation>) -> Self {
        self.entities = entities;
        self
    }

    /// Result reporting that nothing was recognized, at full confidence
    pub fn no_intent(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            entities: vec![EntityAnnotation::new(NO_INTENT_LABEL, NO_INTENT_LABEL)],
            top_intent: IntentScore::new(Intent::NoIntent, 1.0),
        }
    }

    pub fn score(&self) -> f64 {
        self.top_intent.score
    }
}

/// Outgoing NLU request, adapted per client before it is sent
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NluRequest {
    pub query: String,
    /// Intents the service should restrict itself to, when supported
    pub intent_scope: Vec<String>,
    /// Provider-specific parameters
    pub params: BTreeMap<String, String>,
}

impl NluRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}
