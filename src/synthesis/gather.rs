//! Concurrent per-collection queries with independent timeouts.

use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::gateway::{CollectionGateway, GatewayError};
use crate::routing::PlannedCollection;
use crate::scoring::Candidate;

use super::types::CollectionOutcome;

/// Queries one collection, turning an elapsed `timeout` into
/// [`GatewayError::Timeout`].
pub async fn query_collection(
    gateway: &dyn CollectionGateway,
    query: &str,
    collection: &str,
    limit: usize,
    user_level: u8,
    timeout: Duration,
) -> Result<Vec<Candidate>, GatewayError> {
    let hits = tokio::time::timeout(timeout, gateway.search(query, collection, limit, user_level))
        .await
        .map_err(|_| GatewayError::Timeout {
            collection: collection.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })??;

    Ok(hits
        .into_iter()
        .map(|hit| hit.into_candidate(collection))
        .collect())
}

/// Result of one scatter-gather pass, in plan order.
#[derive(Debug, Default)]
pub struct Gathered {
    pub outcomes: Vec<CollectionOutcome>,
    pub candidates: Vec<Candidate>,
}

impl Gathered {
    pub fn succeeded(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.success)
            .map(|o| o.collection.as_str())
    }

    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| o.collection.as_str())
    }
}

/// Queries every planned collection concurrently and waits for all of them.
///
/// A failed or timed-out collection contributes no candidates and is marked
/// unsuccessful. Output order follows `plan`, not completion order.
/// Dropping the returned future cancels every outstanding query.
pub async fn scatter(
    gateway: &dyn CollectionGateway,
    query: &str,
    plan: &[PlannedCollection],
    user_level: u8,
    limit: usize,
    timeout: Duration,
) -> Gathered {
    let queries = plan.iter().map(|planned| async move {
        let started = Instant::now();
        let result = query_collection(
            gateway,
            query,
            &planned.collection,
            limit,
            user_level,
            timeout,
        )
        .await;
        (planned, result, started.elapsed())
    });

    let mut gathered = Gathered::default();
    for (planned, result, elapsed) in join_all(queries).await {
        let outcome = |success, hits, error| CollectionOutcome {
            collection: planned.collection.clone(),
            priority: planned.priority,
            success,
            hits,
            error,
            duration_ms: elapsed.as_millis() as u64,
        };

        match result {
            Ok(candidates) => {
                debug!(
                    collection = %planned.collection,
                    hits = candidates.len(),
                    "Collection answered"
                );
                gathered.outcomes.push(outcome(true, candidates.len(), None));
                gathered.candidates.extend(candidates);
            }
            Err(e) => {
                warn!(collection = %planned.collection, error = %e, "Collection query failed");
                gathered.outcomes.push(outcome(false, 0, Some(e.to_string())));
            }
        }
    }

    gathered
}
