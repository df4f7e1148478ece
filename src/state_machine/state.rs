//! Prompt state types

use crate::config::PromptOptions;
use crate::nlu::NluResult;
use crate::recognizer::{BooleanRecognizer, RecognitionOutcome};
use serde::{Deserialize, Serialize};

/// Final answer of a prompt session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptOutcome {
    Affirmative,
    Negative,
    /// An NLU service recognized an accepted intent, or reported that nothing
    /// was recognized after the patterns already had their chance
    NluMatch(NluResult),
    TooManyAttempts,
}

impl PromptOutcome {
    /// Terminal outcome for a recognition, if it classified the reply
    pub fn from_recognition(recognition: RecognitionOutcome) -> Option<Self> {
        match recognition {
            RecognitionOutcome::Affirmative => Some(PromptOutcome::Affirmative),
            RecognitionOutcome::Negative => Some(PromptOutcome::Negative),
            RecognitionOutcome::Indeterminate => None,
        }
    }
}

/// Prompt session state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptState {
    /// Created, prompt not yet shown
    #[default]
    Start,

    /// Suspended until the next reply arrives
    AwaitingResponse { remaining_attempts: u32 },

    /// Reply received, NLU query in flight
    Deciding {
        reply: String,
        remaining_attempts: u32,
    },

    /// Outcome produced; the session accepts no further events
    Terminal { outcome: PromptOutcome },
}

impl PromptState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PromptState::Terminal { .. })
    }

    pub fn remaining_attempts(&self) -> Option<u32> {
        match self {
            PromptState::AwaitingResponse { remaining_attempts }
            | PromptState::Deciding {
                remaining_attempts, ..
            } => Some(*remaining_attempts),
            PromptState::Start | PromptState::Terminal { .. } => None,
        }
    }

    pub fn outcome(&self) -> Option<&PromptOutcome> {
        match self {
            PromptState::Terminal { outcome } => Some(outcome),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PromptState::Start => "start",
            PromptState::AwaitingResponse { .. } => "awaiting_response",
            PromptState::Deciding { .. } => "deciding",
            PromptState::Terminal { .. } => "terminal",
        }
    }
}

/// Immutable configuration of a prompt session
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub options: PromptOptions,
    recognizer: BooleanRecognizer,
}

impl PromptContext {
    pub fn new(options: PromptOptions) -> Self {
        let recognizer = BooleanRecognizer::new(options.patterns.clone());
        Self {
            options,
            recognizer,
        }
    }

    pub fn recognize(&self, text: &str) -> RecognitionOutcome {
        self.recognizer.recognize(text)
    }
}
