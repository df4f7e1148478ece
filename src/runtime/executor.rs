//! Prompt runtime executor

use super::traits::{MessageSink, ReplySource};
use super::{PromptError, PromptSnapshot, TurnStatus};

use crate::config::PromptOptions;
use crate::nlu::{resolve_strongest, FanOut, NluClient};
use crate::state_machine::{transition, Effect, Event, PromptContext, PromptOutcome, PromptState};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Effects delivered to the sink once a turn has succeeded
enum Outbound {
    Message(String),
    Complete(PromptOutcome),
}

/// Drives one prompt session against a set of NLU clients and a message sink
pub struct PromptRuntime<S>
where
    S: MessageSink,
{
    session_id: String,
    context: PromptContext,
    state: PromptState,
    clients: Arc<[Arc<dyn NluClient>]>,
    sink: S,
    /// Threaded through every NLU call and the wait for replies
    cancel: CancellationToken,
    fan_out: FanOut,
}

impl<S> PromptRuntime<S>
where
    S: MessageSink,
{
    pub fn new(
        options: PromptOptions,
        clients: impl Into<Arc<[Arc<dyn NluClient>]>>,
        sink: S,
    ) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            context: PromptContext::new(options),
            state: PromptState::Start,
            clients: clients.into(),
            sink,
            cancel: CancellationToken::new(),
            fan_out: FanOut::default(),
        }
    }

    /// Resume a session persisted with [`PromptRuntime::snapshot`]
    pub fn restore(
        snapshot: PromptSnapshot,
        clients: impl Into<Arc<[Arc<dyn NluClient>]>>,
        sink: S,
    ) -> Self {
        tracing::debug!(
            session_id = %snapshot.session_id,
            state = snapshot.state.name(),
            "Restoring prompt session"
        );
        Self {
            session_id: snapshot.session_id,
            context: PromptContext::new(snapshot.options),
            state: snapshot.state,
            clients: clients.into(),
            sink,
            cancel: CancellationToken::new(),
            fan_out: FanOut::default(),
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = fan_out;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> &PromptState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn snapshot(&self) -> PromptSnapshot {
        PromptSnapshot {
            session_id: self.session_id.clone(),
            options: self.context.options.clone(),
            state: self.state.clone(),
        }
    }

    /// Show the prompt
    pub async fn start(&mut self) -> Result<TurnStatus, PromptError> {
        tracing::info!(session_id = %self.session_id, "Starting prompt session");
        self.process_event(Event::Begin).await
    }

    /// Feed one user reply through the state machine
    pub async fn handle_reply(&mut self, text: impl Into<String>) -> Result<TurnStatus, PromptError> {
        self.process_event(Event::user_reply(text)).await
    }

    /// Run the whole session, pulling replies from `replies` until an outcome is reached
    pub async fn run<R>(mut self, replies: &mut R) -> Result<PromptOutcome, PromptError>
    where
        R: ReplySource + ?Sized,
    {
        let mut status = if matches!(self.state, PromptState::Start) {
            self.start().await?
        } else {
            self.status()
        };

        loop {
            if let TurnStatus::Complete(outcome) = status {
                return Ok(outcome);
            }

            let reply = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(PromptError::Cancelled),
                reply = replies.next_reply() => reply.ok_or(PromptError::RepliesExhausted)?,
            };
            status = self.handle_reply(reply).await?;
        }
    }

    /// Run one turn atomically
    ///
    /// Transitions and NLU queries work on a copy of the state. The copy is
    /// committed, and queued messages delivered, only when the whole chain of
    /// events succeeded.
    async fn process_event(&mut self, event: Event) -> Result<TurnStatus, PromptError> {
        match self.compute_turn(event).await {
            Ok((state, outbound)) => {
                self.state = state;
                for item in outbound {
                    self.deliver(item).await?;
                }
                Ok(self.status())
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    state = self.state.name(),
                    error = %e,
                    "Prompt turn failed"
                );
                Err(e)
            }
        }
    }

    async fn compute_turn(
        &self,
        event: Event,
    ) -> Result<(PromptState, Vec<Outbound>), PromptError> {
        let mut state = self.state.clone();
        let mut outbound = Vec::new();
        let mut events_to_process = VecDeque::from([event]);

        while let Some(current_event) = events_to_process.pop_front() {
            let result = transition(&state, &self.context, current_event)?;

            tracing::debug!(
                session_id = %self.session_id,
                from = state.name(),
                to = result.new_state.name(),
                remaining_attempts = ?result.new_state.remaining_attempts(),
                "Prompt state transition"
            );
            state = result.new_state;

            for effect in result.effects {
                match effect {
                    Effect::ResolveNlu { query } => {
                        let result =
                            resolve_strongest(&self.clients, &query, &self.cancel, self.fan_out)
                                .await?;
                        events_to_process.push_back(Event::NluResolved { result });
                    }
                    Effect::SendMessage { text } => outbound.push(Outbound::Message(text)),
                    Effect::Complete { outcome } => outbound.push(Outbound::Complete(outcome)),
                }
            }
        }

        Ok((state, outbound))
    }

    async fn deliver(&self, item: Outbound) -> Result<(), PromptError> {
        match item {
            Outbound::Message(text) => self
                .sink
                .send_message(&text)
                .await
                .map_err(PromptError::Boundary),
            Outbound::Complete(outcome) => {
                tracing::info!(
                    session_id = %self.session_id,
                    outcome = ?outcome,
                    "Prompt session complete"
                );
                self.sink
                    .complete(&outcome)
                    .await
                    .map_err(PromptError::Boundary)
            }
        }
    }

    fn status(&self) -> TurnStatus {
        match &self.state {
            PromptState::Terminal { outcome } => TurnStatus::Complete(outcome.clone()),
            _ => TurnStatus::Pending,
        }
    }
}
