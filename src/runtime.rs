//! Runtime for executing prompt sessions
//!
//! The state machine decides; the runtime performs the effects it asks for,
//! feeds NLU answers back in, and talks to the session boundary.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::PromptRuntime;
pub use traits::*;

use crate::config::PromptOptions;
use crate::nlu::ResolveError;
use crate::state_machine::{PromptOutcome, PromptState, TransitionError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by a prompt turn
///
/// A turn that fails leaves the session exactly where it was.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt session cancelled")]
    Cancelled,
    #[error(transparent)]
    Resolve(ResolveError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("session boundary failed: {0}")]
    Boundary(String),
    #[error("reply source closed before the prompt completed")]
    RepliesExhausted,
}

impl From<ResolveError> for PromptError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::Cancelled => PromptError::Cancelled,
            other => PromptError::Resolve(other),
        }
    }
}

/// Where a session stands after a turn
#[derive(Debug, Clone, PartialEq)]
pub enum TurnStatus {
    /// Waiting for the next user reply
    Pending,
    Complete(PromptOutcome),
}

/// Everything needed to resume a suspended session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSnapshot {
    pub session_id: String,
    pub options: PromptOptions,
    pub state: PromptState,
}

impl PromptSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
