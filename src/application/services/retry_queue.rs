use crate::application::ports::RemoteStore;
use crate::domain::entities::{OperationKind, PendingOperation};
use crate::shared::error::{AppError, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// What a drain pass accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    pub replayed: u32,
    pub dropped: u32,
    pub remaining: usize,
}

/// Ordered queue of remote writes that failed on connectivity.
///
/// Operations replay strictly FIFO when connectivity returns. A failing head
/// operation goes back to the front and stops the pass, so nothing behind it
/// can skip ahead of it. An operation that keeps failing is dropped once it
/// exhausts `max_retries` attempts rather than blocking the queue forever.
pub struct RetryQueue {
    operations: Arc<RwLock<VecDeque<PendingOperation>>>,
    draining: Arc<RwLock<bool>>,
    max_retries: u32,
}

impl RetryQueue {
    pub fn new(max_retries: u32) -> Self {
        Self {
            operations: Arc::new(RwLock::new(VecDeque::new())),
            draining: Arc::new(RwLock::new(false)),
            max_retries,
        }
    }

    pub async fn enqueue(&self, operation: PendingOperation) {
        info!("Queued for replay: {}", operation.describe());
        self.operations.write().await.push_back(operation);
    }

    pub async fn len(&self) -> usize {
        self.operations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.operations.read().await.is_empty()
    }

    /// Replays queued operations in order until the queue is empty or the
    /// head fails. At most one drain runs at a time; a re-entrant call is a
    /// no-op.
    pub async fn drain(&self, remote: &dyn RemoteStore) -> DrainOutcome {
        {
            let mut draining = self.draining.write().await;
            if *draining {
                return DrainOutcome::default();
            }
            *draining = true;
        }

        let mut outcome = DrainOutcome::default();
        loop {
            let head = self.operations.write().await.pop_front();
            let Some(mut operation) = head else {
                break;
            };

            match execute(remote, &operation).await {
                Ok(()) => {
                    info!("Replayed {}", operation.describe());
                    outcome.replayed += 1;
                }
                Err(err) => {
                    operation.attempts += 1;
                    if operation.attempts >= self.max_retries {
                        error!(
                            "Dropping {} after {} attempts: {}",
                            operation.describe(),
                            operation.attempts,
                            err
                        );
                        outcome.dropped += 1;
                        continue;
                    }
                    warn!(
                        "Replay failed for {} ({}), stopping drain to preserve order",
                        operation.describe(),
                        err
                    );
                    self.operations.write().await.push_front(operation);
                    break;
                }
            }
        }

        outcome.remaining = self.len().await;
        *self.draining.write().await = false;
        outcome
    }
}

async fn execute(remote: &dyn RemoteStore, operation: &PendingOperation) -> Result<()> {
    match operation.kind {
        OperationKind::Insert => remote
            .insert(operation.table, operation.payload.clone())
            .await
            .map(|_| ()),
        OperationKind::Update => {
            let id = operation.record_id.as_ref().ok_or_else(|| {
                AppError::Internal("queued update is missing a record id".to_string())
            })?;
            remote
                .update(operation.table, id, operation.payload.clone())
                .await
                .map(|_| ())
        }
        OperationKind::Delete => {
            let id = operation.record_id.as_ref().ok_or_else(|| {
                AppError::Internal("queued delete is missing a record id".to_string())
            })?;
            remote.delete(operation.table, id).await
        }
    }
}
