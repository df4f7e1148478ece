//! Prompt state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! Pattern recognition runs inside the transition; NLU queries are effects
//! whose answers come back as events.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{PromptContext, PromptOutcome, PromptState};
pub use transition::{transition, TransitionError, TransitionResult};
