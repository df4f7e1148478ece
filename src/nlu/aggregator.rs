//! Query several NLU clients and keep the strongest answer

use super::{NluClient, NluRequest, NluResult, ResolveError};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// How the clients of one aggregation are queried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOut {
    /// One client after another, in collection order
    #[default]
    Sequential,
    /// All clients at once; results are still ranked in collection order
    Concurrent,
}

impl FromStr for FanOut {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(FanOut::Sequential),
            "concurrent" => Ok(FanOut::Concurrent),
            other => Err(format!("unknown fan-out mode '{other}'")),
        }
    }
}

/// Query every client and return the result with the strongest top intent
///
/// Ties go to the earliest client in `clients`. The first client failure
/// aborts the whole aggregation.
pub async fn resolve_strongest(
    clients: &[Arc<dyn NluClient>],
    query: &str,
    cancel: &CancellationToken,
    fan_out: FanOut,
) -> Result<NluResult, ResolveError> {
    if clients.is_empty() {
        return Err(ResolveError::InvalidInput(
            "at least one NLU client is required".to_string(),
        ));
    }
    if query.trim().is_empty() {
        return Err(ResolveError::InvalidInput("query text is blank".to_string()));
    }

    let results = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(ResolveError::Cancelled),
        results = query_all(clients, query, cancel, fan_out) => results?,
    };

    select_strongest(results)
        .ok_or_else(|| ResolveError::InvalidInput("no NLU results collected".to_string()))
}

async fn query_all(
    clients: &[Arc<dyn NluClient>],
    query: &str,
    cancel: &CancellationToken,
    fan_out: FanOut,
) -> Result<Vec<NluResult>, ResolveError> {
    match fan_out {
        FanOut::Sequential => {
            let mut results = Vec::with_capacity(clients.len());
            for client in clients {
                results.push(query_one(client.as_ref(), query, cancel).await?);
            }
            Ok(results)
        }
        // try_join_all yields results in input order, not completion order
        FanOut::Concurrent => {
            try_join_all(
                clients
                    .iter()
                    .map(|client| query_one(client.as_ref(), query, cancel)),
            )
            .await
        }
    }
}

async fn query_one(
    client: &dyn NluClient,
    query: &str,
    cancel: &CancellationToken,
) -> Result<NluResult, ResolveError> {
    tracing::trace!(client = client.name(), query, "Querying NLU client");

    let request = client
        .adapt_request(NluRequest::new(query))
        .map_err(|e| ResolveError::from_client(client.name(), e))?;
    client
        .query(&request, cancel)
        .await
        .map_err(|e| ResolveError::from_client(client.name(), e))
}

/// First result with the strictly highest score; NaN ranks below everything
fn select_strongest(results: Vec<NluResult>) -> Option<NluResult> {
    results.into_iter().reduce(|best, candidate| {
        if rank(candidate.score()).total_cmp(&rank(best.score())) == Ordering::Greater {
            candidate
        } else {
            best
        }
    })
}

fn rank(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}
