//! Trait abstractions for the session boundary
//!
//! These traits enable testing the runtime with mock implementations.

use crate::state_machine::PromptOutcome;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};

/// Outgoing side of the session boundary
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Show a message to the user
    async fn send_message(&self, text: &str) -> Result<(), String>;

    /// Deliver the session's outcome; called exactly once per session
    async fn complete(&self, outcome: &PromptOutcome) -> Result<(), String>;
}

/// Incoming side of the session boundary
#[async_trait]
pub trait ReplySource: Send {
    /// Wait for the next user reply; `None` once no more replies can arrive
    async fn next_reply(&mut self) -> Option<String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: MessageSink + ?Sized> MessageSink for Arc<T> {
    async fn send_message(&self, text: &str) -> Result<(), String> {
        (**self).send_message(text).await
    }

    async fn complete(&self, outcome: &PromptOutcome) -> Result<(), String> {
        (**self).complete(outcome).await
    }
}

#[async_trait]
impl ReplySource for mpsc::Receiver<String> {
    async fn next_reply(&mut self) -> Option<String> {
        self.recv().await
    }
}

// ============================================================================
// Line-oriented adapters
// ============================================================================

/// Writes each message as a line to an async writer
pub struct LineSink<W> {
    writer: Mutex<W>,
}

impl<W> LineSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    async fn write_line(&self, line: &str) -> Result<(), String> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(|e| e.to_string())?;
        writer.flush().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl<W> MessageSink for LineSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send_message(&self, text: &str) -> Result<(), String> {
        self.write_line(text).await
    }

    async fn complete(&self, outcome: &PromptOutcome) -> Result<(), String> {
        self.write_line(&outcome_report(outcome)).await
    }
}

/// Reads one reply per non-empty line from an async reader
pub struct LineReplies<R> {
    lines: tokio::io::Lines<R>,
}

impl<R> LineReplies<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R> ReplySource for LineReplies<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_reply(&mut self) -> Option<String> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => return Some(line),
                Ok(None) => return None,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read reply");
                    return None;
                }
            }
        }
    }
}

/// One-line summary of an outcome, as shown by the line-oriented host
pub fn outcome_report(outcome: &PromptOutcome) -> String {
    match outcome {
        PromptOutcome::Affirmative => "Returned: Yes".to_string(),
        PromptOutcome::Negative => "Returned: No".to_string(),
        PromptOutcome::TooManyAttempts => "Returned: TooManyAttempts".to_string(),
        PromptOutcome::NluMatch(result) => {
            format!("Returned intent: {}", result.top_intent.intent)
        }
    }
}
