//! Mock implementations for testing
//!
//! These mocks enable integration testing without real NLU services or a
//! console.

use super::traits::*;
use crate::nlu::{NluClient, NluError, NluRequest, NluResult};
use crate::state_machine::PromptOutcome;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Mock NLU Client
// ============================================================================

/// Mock NLU client that answers from a queue of canned responses
///
/// Responses are consumed in order; the last one keeps being returned.
pub struct MockNluClient {
    name: String,
    responses: Mutex<VecDeque<Result<NluResult, NluError>>>,
    adapt_error: Option<NluError>,
    params: Vec<(String, String)>,
    delay: Option<Duration>,
    /// Adapted requests passed to `query`
    requests: Mutex<Vec<NluRequest>>,
}

impl MockNluClient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responses: Mutex::new(VecDeque::new()),
            adapt_error: None,
            params: Vec::new(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    #[must_use]
    pub fn returning(self, result: NluResult) -> Self {
        self.responses.lock().unwrap().push_back(Ok(result));
        self
    }

    /// Queue a failed query
    #[must_use]
    pub fn failing(self, error: NluError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Reject every request before it is sent
    #[must_use]
    pub fn failing_adapt(mut self, error: NluError) -> Self {
        self.adapt_error = Some(error);
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a service-specific parameter while adapting requests
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn recorded_requests(&self) -> Vec<NluRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> Result<NluResult, NluError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            return responses.pop_front().unwrap();
        }
        responses
            .front()
            .cloned()
            .unwrap_or_else(|| Err(NluError::network("No mock response queued")))
    }
}

#[async_trait]
impl NluClient for MockNluClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn adapt_request(&self, mut request: NluRequest) -> Result<NluRequest, NluError> {
        if let Some(error) = &self.adapt_error {
            return Err(error.clone());
        }
        for (key, value) in &self.params {
            request.params.insert(key.clone(), value.clone());
        }
        Ok(request)
    }

    async fn query(
        &self,
        request: &NluRequest,
        cancel: &CancellationToken,
    ) -> Result<NluResult, NluError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::select! {
                () = cancel.cancelled() => return Err(NluError::cancelled()),
                () = tokio::time::sleep(delay) => {}
            }
        }

        self.next_response()
    }
}

/// NLU client that never answers until cancelled
pub struct PendingNluClient {
    name: String,
}

impl PendingNluClient {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl NluClient for PendingNluClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn adapt_request(&self, request: NluRequest) -> Result<NluRequest, NluError> {
        Ok(request)
    }

    async fn query(
        &self,
        _request: &NluRequest,
        cancel: &CancellationToken,
    ) -> Result<NluResult, NluError> {
        cancel.cancelled().await;
        Err(NluError::cancelled())
    }
}

// ============================================================================
// Recording Sink
// ============================================================================

/// Sink that keeps the transcript the user would have seen
#[derive(Default)]
pub struct RecordingSink {
    transcript: Mutex<Vec<String>>,
    outcomes: Mutex<Vec<PromptOutcome>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages plus the outcome report line, in delivery order
    pub fn transcript(&self) -> Vec<String> {
        self.transcript.lock().unwrap().clone()
    }

    pub fn outcomes(&self) -> Vec<PromptOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send_message(&self, text: &str) -> Result<(), String> {
        self.transcript.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn complete(&self, outcome: &PromptOutcome) -> Result<(), String> {
        self.transcript.lock().unwrap().push(outcome_report(outcome));
        self.outcomes.lock().unwrap().push(outcome.clone());
        Ok(())
    }
}

// ============================================================================
// Scripted Replies
// ============================================================================

/// Reply source that hands out a fixed script, then reports it is closed
pub struct ScriptedReplies {
    replies: VecDeque<String>,
}

impl ScriptedReplies {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl ReplySource for ScriptedReplies {
    async fn next_reply(&mut self) -> Option<String> {
        self.replies.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Precedence, PromptOptions};
    use crate::nlu::{
        FanOut, Intent, IntentScore, NluErrorKind, ResolveError, UtteranceTableClient,
    };
    use crate::runtime::{PromptError, PromptRuntime, PromptSnapshot, TurnStatus};
    use crate::state_machine::{PromptState, TransitionError};
    use std::sync::Arc;

    const PROMPT: &str = "What would you do now?";
    const TOO_MANY: &str = "I have no idea what you meant";

    fn demo_options() -> PromptOptions {
        PromptOptions::new(PROMPT)
            .with_attempts(1)
            .with_too_many_attempts(TOO_MANY)
            .with_intents(["Everything"])
    }

    fn demo_clients() -> Vec<Arc<dyn NluClient>> {
        vec![Arc::new(
            UtteranceTableClient::new("demo")
                .with_intent("None", ["No", "Yes", "I don't know"])
                .with_intent("Everything", ["Everything"]),
        )]
    }

    fn runtime(options: PromptOptions) -> PromptRuntime<Arc<RecordingSink>> {
        PromptRuntime::new(options, demo_clients(), Arc::new(RecordingSink::new()))
    }

    fn result(intent: Intent, score: f64) -> NluResult {
        NluResult::new("query", IntentScore::new(intent, score))
    }

    async fn run_script(options: PromptOptions, replies: &[&str]) -> (PromptOutcome, Vec<String>) {
        let sink = Arc::new(RecordingSink::new());
        let rt = PromptRuntime::new(options, demo_clients(), Arc::clone(&sink));
        let mut script = ScriptedReplies::new(replies.iter().copied());
        let outcome = rt.run(&mut script).await.unwrap();
        assert_eq!(sink.outcomes(), vec![outcome.clone()]);
        (outcome, sink.transcript())
    }

    #[tokio::test]
    async fn test_recording_sink() {
        let sink = RecordingSink::new();
        sink.send_message("hello").await.unwrap();
        sink.complete(&PromptOutcome::Negative).await.unwrap();
        assert_eq!(sink.transcript(), vec!["hello", "Returned: No"]);
        assert_eq!(sink.outcomes(), vec![PromptOutcome::Negative]);
    }

    #[tokio::test]
    async fn test_mock_client_repeats_last_response() {
        let mock = MockNluClient::new("a")
            .failing(NluError::server_error("first call fails"))
            .returning(result(Intent::named("A"), 0.5));
        let cancel = CancellationToken::new();
        let request = NluRequest::new("query");

        assert!(mock.query(&request, &cancel).await.is_err());
        assert!(mock.query(&request, &cancel).await.is_ok());
        assert!(mock.query(&request, &cancel).await.is_ok());
        assert_eq!(mock.recorded_requests().len(), 3);
    }

    // ========================================================================
    // Console scenarios
    // ========================================================================

    #[tokio::test]
    async fn test_yes_is_affirmative() {
        let (outcome, transcript) = run_script(demo_options(), &["Yes"]).await;
        assert_eq!(outcome, PromptOutcome::Affirmative);
        assert_eq!(transcript, vec![PROMPT, "Returned: Yes"]);
    }

    #[tokio::test]
    async fn test_no_is_negative() {
        let (outcome, transcript) = run_script(demo_options(), &["No"]).await;
        assert_eq!(outcome, PromptOutcome::Negative);
        assert_eq!(transcript, vec![PROMPT, "Returned: No"]);
    }

    #[tokio::test]
    async fn test_allow_listed_intent_is_returned() {
        let (outcome, transcript) = run_script(demo_options(), &["Everything"]).await;
        match outcome {
            PromptOutcome::NluMatch(result) => {
                assert_eq!(result.top_intent.intent, Intent::named("Everything"));
                assert_eq!(result.query, "Everything");
            }
            other => panic!("Expected NluMatch, got {other:?}"),
        }
        assert_eq!(transcript, vec![PROMPT, "Returned intent: Everything"]);
    }

    #[tokio::test]
    async fn test_retry_then_yes() {
        let options = demo_options();
        let retry = options.retry.clone();
        let (outcome, transcript) = run_script(options, &["I don't know", "Yes"]).await;
        assert_eq!(outcome, PromptOutcome::Affirmative);
        assert_eq!(transcript, vec![PROMPT, retry.as_str(), "Returned: Yes"]);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let options = demo_options();
        let retry = options.retry.clone();
        let (outcome, transcript) =
            run_script(options, &["I don't know", "I don't know"]).await;
        assert_eq!(outcome, PromptOutcome::TooManyAttempts);
        assert_eq!(
            transcript,
            vec![PROMPT, retry.as_str(), TOO_MANY, "Returned: TooManyAttempts"]
        );
    }

    // ========================================================================
    // Pattern-first sessions
    // ========================================================================

    #[tokio::test]
    async fn test_pattern_first_skips_nlu_for_recognized_reply() {
        let mock = Arc::new(MockNluClient::new("a").returning(result(Intent::named("Everything"), 1.0)));
        let sink = Arc::new(RecordingSink::new());
        let clients: Vec<Arc<dyn NluClient>> = vec![mock.clone()];
        let rt = PromptRuntime::new(
            demo_options().with_precedence(Precedence::PatternFirst),
            clients,
            Arc::clone(&sink),
        );

        let outcome = rt.run(&mut ScriptedReplies::new(["Yes"])).await.unwrap();
        assert_eq!(outcome, PromptOutcome::Affirmative);
        assert!(mock.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_pattern_first_unmatched_reply_ends_without_retry() {
        let options = demo_options().with_precedence(Precedence::PatternFirst);
        let (outcome, transcript) = run_script(options, &["I don't know"]).await;
        match outcome {
            PromptOutcome::NluMatch(result) => {
                assert_eq!(result.top_intent.intent, Intent::NoIntent);
                assert_eq!(result.query, "I don't know");
                assert_eq!(result.entities.len(), 1);
            }
            other => panic!("Expected NluMatch, got {other:?}"),
        }
        assert_eq!(transcript, vec![PROMPT, "Returned intent: None"]);
    }

    // ========================================================================
    // Turn atomicity
    // ========================================================================

    #[tokio::test]
    async fn test_failed_turn_leaves_state_unchanged() {
        let mock = MockNluClient::new("flaky")
            .failing(NluError::server_error("service unavailable"))
            .returning(result(Intent::NoIntent, 1.0));
        let sink = Arc::new(RecordingSink::new());
        let clients: Vec<Arc<dyn NluClient>> = vec![Arc::new(mock)];
        let mut rt = PromptRuntime::new(demo_options(), clients, Arc::clone(&sink));

        assert_eq!(rt.start().await.unwrap(), TurnStatus::Pending);
        let before = rt.state().clone();

        let err = rt.handle_reply("I don't know").await.unwrap_err();
        match err {
            PromptError::Resolve(ResolveError::Service { client, source }) => {
                assert_eq!(client, "flaky");
                assert_eq!(source.kind, NluErrorKind::ServerError);
            }
            other => panic!("Expected service error, got {other:?}"),
        }
        assert_eq!(rt.state(), &before);
        assert_eq!(sink.transcript(), vec![PROMPT]);

        // The same reply succeeds once the service recovers, spending one attempt
        assert_eq!(rt.handle_reply("I don't know").await.unwrap(), TurnStatus::Pending);
        assert_eq!(
            rt.state(),
            &PromptState::AwaitingResponse {
                remaining_attempts: 0
            }
        );
        assert_eq!(sink.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_reply_is_invalid_input() {
        let mut rt = runtime(demo_options());
        rt.start().await.unwrap();
        let before = rt.state().clone();

        let err = rt.handle_reply("   ").await.unwrap_err();
        assert!(matches!(
            err,
            PromptError::Resolve(ResolveError::InvalidInput(_))
        ));
        assert_eq!(rt.state(), &before);
        assert_eq!(rt.sink().transcript(), vec![PROMPT]);
    }

    #[tokio::test]
    async fn test_reply_before_start_is_rejected() {
        let mut rt = runtime(demo_options());
        let err = rt.handle_reply("Yes").await.unwrap_err();
        assert!(matches!(
            err,
            PromptError::Transition(TransitionError::InvalidTransition(_))
        ));
        assert_eq!(rt.state(), &PromptState::Start);
        assert!(rt.sink().transcript().is_empty());
    }

    #[tokio::test]
    async fn test_completed_session_rejects_replies() {
        let mut rt = runtime(demo_options());
        rt.start().await.unwrap();
        assert_eq!(
            rt.handle_reply("No").await.unwrap(),
            TurnStatus::Complete(PromptOutcome::Negative)
        );

        let err = rt.handle_reply("Yes").await.unwrap_err();
        assert!(matches!(
            err,
            PromptError::Transition(TransitionError::SessionComplete)
        ));
        assert_eq!(rt.sink().outcomes(), vec![PromptOutcome::Negative]);
    }

    #[tokio::test]
    async fn test_closed_reply_source() {
        let rt = runtime(demo_options());
        let err = rt
            .run(&mut ScriptedReplies::new(["I don't know"]))
            .await
            .unwrap_err();
        assert!(matches!(err, PromptError::RepliesExhausted));
    }

    // ========================================================================
    // Suspend and resume
    // ========================================================================

    #[tokio::test]
    async fn test_snapshot_resumes_session() {
        let mut rt = runtime(demo_options());
        rt.start().await.unwrap();
        rt.handle_reply("I don't know").await.unwrap();

        let json = rt.snapshot().to_json().unwrap();
        let snapshot = PromptSnapshot::from_json(&json).unwrap();
        assert_eq!(snapshot, rt.snapshot());
        assert_eq!(
            snapshot.state,
            PromptState::AwaitingResponse {
                remaining_attempts: 0
            }
        );

        let sink = Arc::new(RecordingSink::new());
        let resumed = PromptRuntime::restore(snapshot, demo_clients(), Arc::clone(&sink));
        assert_eq!(resumed.session_id(), rt.session_id());

        let outcome = resumed
            .run(&mut ScriptedReplies::new(["I don't know"]))
            .await
            .unwrap();
        assert_eq!(outcome, PromptOutcome::TooManyAttempts);
        // The prompt is not shown again after resuming
        assert_eq!(sink.transcript(), vec![TOO_MANY, "Returned: TooManyAttempts"]);
    }

    #[tokio::test]
    async fn test_restored_terminal_session_returns_outcome() {
        let snapshot = PromptSnapshot {
            session_id: "done".to_string(),
            options: demo_options(),
            state: PromptState::Terminal {
                outcome: PromptOutcome::Affirmative,
            },
        };
        let sink = Arc::new(RecordingSink::new());
        let rt = PromptRuntime::restore(snapshot, demo_clients(), Arc::clone(&sink));

        let outcome = rt.run(&mut ScriptedReplies::new(Vec::<String>::new())).await.unwrap();
        assert_eq!(outcome, PromptOutcome::Affirmative);
        assert!(sink.transcript().is_empty());
    }

    // ========================================================================
    // Cancellation and fan-out
    // ========================================================================

    #[tokio::test]
    async fn test_cancel_while_waiting_for_reply() {
        let cancel = CancellationToken::new();
        let rt = runtime(demo_options()).with_cancellation(cancel.clone());
        let (_tx, mut rx) = tokio::sync::mpsc::channel::<String>(1);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        let err = tokio::time::timeout(Duration::from_secs(2), rt.run(&mut rx))
            .await
            .expect("run should stop once cancelled")
            .unwrap_err();
        assert!(matches!(err, PromptError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_during_nlu_query() {
        let cancel = CancellationToken::new();
        let clients: Vec<Arc<dyn NluClient>> = vec![Arc::new(PendingNluClient::new("hung"))];
        let sink = Arc::new(RecordingSink::new());
        let mut rt = PromptRuntime::new(demo_options(), clients, Arc::clone(&sink))
            .with_cancellation(cancel.clone());
        rt.start().await.unwrap();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = tokio::time::timeout(Duration::from_secs(2), rt.handle_reply("Yes"))
            .await
            .expect("turn should stop once cancelled")
            .unwrap_err();
        assert!(matches!(err, PromptError::Cancelled));
        assert_eq!(
            rt.state(),
            &PromptState::AwaitingResponse {
                remaining_attempts: 1
            }
        );
        assert_eq!(sink.transcript(), vec![PROMPT]);
    }

    #[tokio::test]
    async fn test_concurrent_fan_out_picks_strongest() {
        let clients: Vec<Arc<dyn NluClient>> = vec![
            Arc::new(
                MockNluClient::new("slow")
                    .returning(result(Intent::named("Everything"), 0.9))
                    .with_delay(Duration::from_millis(30)),
            ),
            Arc::new(MockNluClient::new("fast").returning(result(Intent::named("Other"), 0.4))),
        ];
        let sink = Arc::new(RecordingSink::new());
        let rt = PromptRuntime::new(demo_options(), clients, Arc::clone(&sink))
            .with_fan_out(FanOut::Concurrent);

        let outcome = rt
            .run(&mut ScriptedReplies::new(["whatever"]))
            .await
            .unwrap();
        match outcome {
            PromptOutcome::NluMatch(result) => {
                assert_eq!(result.top_intent.intent, Intent::named("Everything"));
            }
            other => panic!("Expected NluMatch, got {other:?}"),
        }
    }
}
