//! In-process NLU client backed by a fixed utterance table

use super::{Intent, IntentScore, NluClient, NluError, NluRequest, NluResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tokio_util::sync::CancellationToken;

fn default_score() -> f64 {
    1.0
}

/// Serializable description of an [`UtteranceTableClient`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableClientConfig {
    pub name: String,
    /// Intent label -> utterances that resolve to it
    pub intents: BTreeMap<String, Vec<String>>,
    /// Score reported for every known utterance
    #[serde(default = "default_score")]
    pub score: f64,
    /// Report `NoIntent` instead of failing on unknown utterances
    #[serde(default)]
    pub lenient: bool,
}

/// NLU client that answers from a fixed utterance -> intent table
///
/// Utterances are matched after trimming, ignoring case. The label `None`
/// maps to [`Intent::NoIntent`]. Unknown utterances fail with an
/// `InvalidRequest` error unless the client is lenient.
#[derive(Debug, Clone)]
pub struct UtteranceTableClient {
    name: String,
    utterances: HashMap<String, Intent>,
    intent_names: Vec<String>,
    score: f64,
    lenient: bool,
}

impl UtteranceTableClient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            utterances: HashMap::new(),
            intent_names: Vec::new(),
            score: 1.0,
            lenient: false,
        }
    }

    /// Map each of `utterances` to the intent labeled `label`
    #[must_use]
    pub fn with_intent<I>(mut self, label: &str, utterances: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let intent = Intent::from_label(label);
        if let Some(name) = intent.name() {
            if !self.intent_names.iter().any(|known| known == name) {
                self.intent_names.push(name.to_string());
            }
        }
        for utterance in utterances {
            self.utterances
                .insert(normalize(utterance.as_ref()), intent.clone());
        }
        self
    }

    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    pub fn from_config(config: &TableClientConfig) -> Self {
        let mut client = Self::new(config.name.clone()).with_score(config.score);
        for (label, utterances) in &config.intents {
            client = client.with_intent(label, utterances);
        }
        if config.lenient {
            client = client.lenient();
        }
        client
    }
}

fn normalize(utterance: &str) -> String {
    utterance.trim().to_lowercase()
}

#[async_trait]
impl NluClient for UtteranceTableClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn adapt_request(&self, mut request: NluRequest) -> Result<NluRequest, NluError> {
        request.intent_scope.clone_from(&self.intent_names);
        Ok(request)
    }

    async fn query(
        &self,
        request: &NluRequest,
        cancel: &CancellationToken,
    ) -> Result<NluResult, NluError> {
        if cancel.is_cancelled() {
            return Err(NluError::cancelled());
        }

        match self.utterances.get(&normalize(&request.query)) {
            Some(intent) => Ok(NluResult::new(
                request.query.clone(),
                IntentScore::new(intent.clone(), self.score),
            )),
            None if self.lenient => Ok(NluResult::new(
                request.query.clone(),
                IntentScore::new(Intent::NoIntent, 0.0),
            )),
            None => Err(NluError::invalid_request(format!(
                "Intent has not been set up for '{}'",
                request.query
            ))),
        }
    }
}
