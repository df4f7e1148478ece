//! NLU-backed yes/no prompt
//!
//! A prompt asks the user a question and decides what the reply meant. Replies
//! go to one or more NLU services and to a fuzzy yes/no pattern recognizer; a
//! pure state machine decides which answer wins and when to ask again.

#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

pub mod config;
pub mod nlu;
pub mod recognizer;
pub mod runtime;
pub mod state_machine;

pub use config::{DemoConfig, Precedence, PromptOptions};
pub use nlu::{FanOut, LoggingClient, NluClient, NluResult, UtteranceTableClient};
pub use recognizer::{BooleanRecognizer, RecognitionOutcome};
pub use runtime::{PromptError, PromptRuntime, PromptSnapshot, TurnStatus};
pub use state_machine::{PromptOutcome, PromptState};
