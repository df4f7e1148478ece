//! Pure state transition function

use super::{Effect, Event, PromptContext, PromptOutcome, PromptState};
use crate::config::Precedence;
use crate::nlu::{Intent, NluResult};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: PromptState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: PromptState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Enter the terminal state, delivering `outcome` as the last effect
    fn terminal(outcome: PromptOutcome) -> Self {
        Self::new(PromptState::Terminal {
            outcome: outcome.clone(),
        })
        .with_effect(Effect::Complete { outcome })
    }

    /// Hand the reply to the NLU aggregator
    fn deciding(reply: String, remaining_attempts: u32) -> Self {
        let query = reply.clone();
        Self::new(PromptState::Deciding {
            reply,
            remaining_attempts,
        })
        .with_effect(Effect::resolve_nlu(query))
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Prompt session already produced its outcome")]
    SessionComplete,
    #[error("Prompt is waiting for a user reply")]
    AwaitingReply,
    #[error("Prompt is still deciding on the previous reply")]
    DecisionPending,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
pub fn transition(
    state: &PromptState,
    context: &PromptContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let precedence = context.options.precedence;

    match (state, event) {
        (PromptState::Terminal { .. }, _) => Err(TransitionError::SessionComplete),

        // ============================================================
        // Start
        // ============================================================
        (PromptState::Start, Event::Begin) => Ok(TransitionResult::new(
            PromptState::AwaitingResponse {
                remaining_attempts: context.options.attempts,
            },
        )
        .with_effect(Effect::send_message(&context.options.prompt))),

        (PromptState::Start, event) => Err(TransitionError::InvalidTransition(format!(
            "{} before the prompt was shown",
            event.name()
        ))),

        // ============================================================
        // Reply received
        // ============================================================
        (PromptState::AwaitingResponse { remaining_attempts }, Event::UserReply { text }) => {
            match precedence {
                Precedence::NluFirst => Ok(TransitionResult::deciding(text, *remaining_attempts)),
                Precedence::PatternFirst => {
                    match PromptOutcome::from_recognition(context.recognize(&text)) {
                        Some(outcome) => Ok(TransitionResult::terminal(outcome)),
                        None => Ok(TransitionResult::deciding(text, *remaining_attempts)),
                    }
                }
            }
        }

        (PromptState::AwaitingResponse { .. }, Event::NluResolved { .. }) => {
            Err(TransitionError::AwaitingReply)
        }

        (PromptState::AwaitingResponse { .. }, Event::Begin) => Err(
            TransitionError::InvalidTransition("prompt already shown".to_string()),
        ),

        // ============================================================
        // NLU answer
        // ============================================================
        (
            PromptState::Deciding {
                reply,
                remaining_attempts,
            },
            Event::NluResolved { result },
        ) => {
            if is_accepted(context, &result) {
                return Ok(TransitionResult::terminal(PromptOutcome::NluMatch(result)));
            }

            match precedence {
                // The patterns still get a look before a retry is spent
                Precedence::NluFirst => {
                    match PromptOutcome::from_recognition(context.recognize(reply)) {
                        Some(outcome) => Ok(TransitionResult::terminal(outcome)),
                        None => Ok(retry(context, *remaining_attempts)),
                    }
                }
                // Patterns already failed; an unmatched intent ends the session
                Precedence::PatternFirst => Ok(TransitionResult::terminal(
                    PromptOutcome::NluMatch(NluResult::no_intent(result.query)),
                )),
            }
        }

        (PromptState::Deciding { .. }, _) => Err(TransitionError::DecisionPending),
    }
}

/// Whether an NLU answer names an intent the prompt accepts
fn is_accepted(context: &PromptContext, result: &NluResult) -> bool {
    match &result.top_intent.intent {
        Intent::Named(name) if !name.is_empty() => context.options.allows_intent(name),
        _ => false,
    }
}

/// Ask again while attempts remain, otherwise give up
fn retry(context: &PromptContext, remaining_attempts: u32) -> TransitionResult {
    match remaining_attempts.checked_sub(1) {
        Some(remaining_attempts) => {
            TransitionResult::new(PromptState::AwaitingResponse { remaining_attempts })
                .with_effect(Effect::send_message(&context.options.retry))
        }
        None => TransitionResult::new(PromptState::Terminal {
            outcome: PromptOutcome::TooManyAttempts,
        })
        .with_effect(Effect::send_message(&context.options.too_many_attempts))
        .with_effect(Effect::Complete {
            outcome: PromptOutcome::TooManyAttempts,
        }),
    }
}
