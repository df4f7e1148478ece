//! Console host for the NLU-backed yes/no prompt
//!
//! Asks one question on stdout, reads replies from stdin, and answers them
//! with in-process utterance-table NLU clients.

use nlu_prompt::nlu::{LoggingClient, NluClient, UtteranceTableClient};
use nlu_prompt::runtime::{LineReplies, LineSink, PromptError, PromptRuntime};
use nlu_prompt::DemoConfig;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the prompt
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nlu_prompt=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = DemoConfig::from_env()?;
    tracing::info!(
        clients = config.clients.len(),
        fan_out = ?config.fan_out,
        precedence = ?config.options.precedence,
        attempts = config.options.attempts,
        "Loaded prompt configuration"
    );

    let clients: Vec<Arc<dyn NluClient>> = config
        .clients
        .iter()
        .map(|client| {
            let inner: Arc<dyn NluClient> = Arc::new(UtteranceTableClient::from_config(client));
            Arc::new(LoggingClient::new(inner)) as Arc<dyn NluClient>
        })
        .collect();

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling prompt");
            on_ctrl_c.cancel();
        }
    });

    let runtime = PromptRuntime::new(config.options, clients, LineSink::new(tokio::io::stdout()))
        .with_fan_out(config.fan_out)
        .with_cancellation(cancel);
    let mut replies = LineReplies::new(BufReader::new(tokio::io::stdin()));

    match runtime.run(&mut replies).await {
        Ok(outcome) => {
            tracing::debug!(outcome = ?outcome, "Prompt finished");
            Ok(())
        }
        Err(PromptError::Cancelled) => Ok(()),
        Err(e) => {
            tracing::error!(error = %e, "Prompt failed");
            Err(e.into())
        }
    }
}
