//! Batch dispatcher: runs the worker once per token, in order
//!
//! Each worker call runs on the blocking thread pool and is awaited before
//! the next token is dispatched, so calls never overlap within a batch. A
//! failing (or panicking) call is reported to the observer and skipped; it
//! never aborts the batch. Successful rows are appended to the table as
//! soon as they are produced.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::Row;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::table::SharedTable;
use crate::worker::Worker;

/// Identifier of one batch invocation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchState {
    Idle,
    Running,
    Dispatching { index: usize },
    Succeeded { index: usize },
    Failed { index: usize },
    Completed,
}

impl BatchState {
    fn can_transition_to(&self, next: &BatchState) -> bool {
        use BatchState::*;
        match (self, next) {
            (Idle, Running) => true,
            (Running, Dispatching { index }) => *index == 0,
            (Running, Completed) => true,
            (Dispatching { index: a }, Succeeded { index: b })
            | (Dispatching { index: a }, Failed { index: b }) => a == b,
            (Succeeded { index: a }, Dispatching { index: b })
            | (Failed { index: a }, Dispatching { index: b }) => *b == a + 1,
            (Succeeded { .. }, Completed) | (Failed { .. }, Completed) => true,
            _ => false,
        }
    }
}

/// A token whose worker call failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFailure {
    /// Position of the token in the input
    pub index: usize,
    pub token: String,
    pub message: String,
}

impl TokenFailure {
    /// Text shown to the user for this failure
    pub fn notification_text(&self) -> String {
        format!("Error getting data from {}: {}", self.token, self.message)
    }
}

/// Summary of a finished batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: BatchId,
    pub tokens: usize,
    pub succeeded: usize,
    pub failures: Vec<TokenFailure>,
    pub state: BatchState,
}

/// Receives batch progress as it happens
#[mockall::automock]
#[async_trait]
pub trait BatchObserver: Send + Sync {
    async fn on_start(&self, batch_id: BatchId, token_count: usize);

    /// A row was appended; `index` is the token's position in the input
    async fn on_row(&self, index: usize, row: &Row);

    async fn on_failure(&self, failure: &TokenFailure);

    async fn on_complete(&self, report: &BatchReport);
}

/// Tracks and logs state transitions of one batch
struct BatchTracker {
    batch_id: BatchId,
    state: BatchState,
}

impl BatchTracker {
    fn new(batch_id: BatchId) -> Self {
        Self {
            batch_id,
            state: BatchState::Idle,
        }
    }

    fn transition(&mut self, next: BatchState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "invalid batch transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(batch = %self.batch_id, from = ?self.state, to = ?next, "batch transition");
        self.state = next;
    }
}

/// Failure message for a worker that returned no fields
pub const EMPTY_ROW_MESSAGE: &str = "worker returned an empty row";

/// Runs batches against one worker
#[derive(Clone)]
pub struct BatchDispatcher {
    worker: Arc<dyn Worker>,
}

impl BatchDispatcher {
    pub fn new(worker: Arc<dyn Worker>) -> Self {
        Self { worker }
    }

    /// Run the worker over `tokens`, appending successful rows to `table`
    pub async fn run<O>(&self, tokens: Vec<String>, table: &SharedTable, observer: &O) -> BatchReport
    where
        O: BatchObserver + ?Sized,
    {
        let batch_id = BatchId::new();
        let mut tracker = BatchTracker::new(batch_id);
        let mut succeeded = 0;
        let mut failures = Vec::new();

        tracker.transition(BatchState::Running);
        shared::tool_info!("🚀 Batch {} started with {} tokens", batch_id, tokens.len());
        observer.on_start(batch_id, tokens.len()).await;

        for (index, token) in tokens.iter().enumerate() {
            tracker.transition(BatchState::Dispatching { index });

            match self.invoke(token).await {
                Ok(row) => {
                    table.write().await.push(row.clone());
                    succeeded += 1;
                    tracker.transition(BatchState::Succeeded { index });
                    observer.on_row(index, &row).await;
                }
                Err(message) => {
                    let failure = TokenFailure {
                        index,
                        token: token.clone(),
                        message,
                    };
                    shared::tool_warn!("⚠️ Batch {}: {}", batch_id, failure.notification_text());
                    tracker.transition(BatchState::Failed { index });
                    observer.on_failure(&failure).await;
                    failures.push(failure);
                }
            }
        }

        tracker.transition(BatchState::Completed);
        let report = BatchReport {
            batch_id,
            tokens: tokens.len(),
            succeeded,
            failures,
            state: tracker.state,
        };
        shared::tool_info!(
            "✅ Batch {} completed: {} succeeded, {} failed",
            batch_id,
            report.succeeded,
            report.failures.len()
        );
        observer.on_complete(&report).await;
        report
    }

    /// Call the worker off the async runtime
    ///
    /// Panics and zero-field rows count as failures; a CSV record cannot
    /// hold zero fields.
    async fn invoke(&self, token: &str) -> Result<Row, String> {
        let worker = self.worker.clone();
        let token = token.to_string();

        match tokio::task::spawn_blocking(move || worker.process(&token)).await {
            Ok(Ok(row)) if row.is_empty() => Err(EMPTY_ROW_MESSAGE.to_string()),
            Ok(Ok(row)) => Ok(row),
            Ok(Err(e)) => Err(e.to_string()),
            Err(join_error) if join_error.is_panic() => {
                let payload = join_error.into_panic();
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(format!("worker panicked: {message}"))
            }
            Err(join_error) => Err(join_error.to_string()),
        }
    }
}
