//! NLU service abstraction
//!
//! Provides a narrow interface over external intent-recognition services and
//! the aggregator that picks the strongest answer among several of them.

pub mod aggregator;
mod error;
mod table;
mod types;

pub use aggregator::{resolve_strongest, FanOut};
pub use error::{NluError, NluErrorKind, ResolveError};
pub use table::{TableClientConfig, UtteranceTableClient};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Common interface for NLU providers
#[async_trait]
pub trait NluClient: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Enrich the outgoing request for this provider (e.g. scope it to configured intents)
    fn adapt_request(&self, request: NluRequest) -> Result<NluRequest, NluError>;

    /// Execute a query
    async fn query(
        &self,
        request: &NluRequest,
        cancel: &CancellationToken,
    ) -> Result<NluResult, NluError>;
}

#[async_trait]
impl<T: NluClient + ?Sized> NluClient for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn adapt_request(&self, request: NluRequest) -> Result<NluRequest, NluError> {
        (**self).adapt_request(request)
    }

    async fn query(
        &self,
        request: &NluRequest,
        cancel: &CancellationToken,
    ) -> Result<NluResult, NluError> {
        (**self).query(request, cancel).await
    }
}

/// Logging wrapper for NLU clients
pub struct LoggingClient {
    inner: Arc<dyn NluClient>,
    name: String,
}

impl LoggingClient {
    pub fn new(inner: Arc<dyn NluClient>) -> Self {
        let name = inner.name().to_string();
        Self { inner, name }
    }
}

#[async_trait]
impl NluClient for LoggingClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn adapt_request(&self, request: NluRequest) -> Result<NluRequest, NluError> {
        self.inner.adapt_request(request)
    }

    async fn query(
        &self,
        request: &NluRequest,
        cancel: &CancellationToken,
    ) -> Result<NluResult, NluError> {
        let start = std::time::Instant::now();
        let result = self.inner.query(request, cancel).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    client = %self.name,
                    duration_ms = %duration.as_millis(),
                    intent = %response.top_intent.intent,
                    score = response.top_intent.score,
                    "NLU query completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    client = %self.name,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    retryable = e.kind.is_retryable(),
                    "NLU query failed"
                );
            }
        }

        result
    }
}
