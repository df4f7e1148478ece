//! Effects produced by state transitions

use super::PromptOutcome;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Show text to the user
    SendMessage { text: String },

    /// Ask the NLU aggregator about `query`; answered with `Event::NluResolved`
    ResolveNlu { query: String },

    /// Deliver the session's outcome to the host
    Complete { outcome: PromptOutcome },
}

impl Effect {
    pub fn send_message(text: impl Into<String>) -> Self {
        Effect::SendMessage { text: text.into() }
    }

    pub fn resolve_nlu(query: impl Into<String>) -> Self {
        Effect::ResolveNlu {
            query: query.into(),
        }
    }
}
