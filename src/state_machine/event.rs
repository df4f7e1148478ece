//! Events that can occur in a prompt session

use crate::nlu::NluResult;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// The host starts the session
    Begin,

    /// The user replied
    UserReply { text: String },

    /// The NLU aggregator answered a `ResolveNlu` effect
    NluResolved { result: NluResult },
}

impl Event {
    pub fn user_reply(text: impl Into<String>) -> Self {
        Event::UserReply { text: text.into() }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::Begin => "begin",
            Event::UserReply { .. } => "user_reply",
            Event::NluResolved { .. } => "nlu_resolved",
        }
    }
}
