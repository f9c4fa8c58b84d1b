//! Transfer engine: scheduler and worker pool.
//!
//! The engine pulls descriptors lazily from the lister and dispatches each
//! one to its own task, with a semaphore bounding the number of concurrent
//! pipelines to `max_workers`. Dispatch follows listing order; completion
//! order is unconstrained. A per-object failure never halts the run - only
//! a pre-flight configuration error or a listing failure aborts it.

mod aggregate;

pub use aggregate::{Aggregator, FailedObject, TransferSummary};

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::events::{EventSender, TransferEvent};
use crate::list::Lister;
use crate::store::{DestStore, ObjectDescriptor, SourceStore};
use crate::transfer::{transfer_object, TransferOutcome, TransferStatus};

/// Descriptors buffered beyond the worker count, so listing stays a step
/// ahead of dispatch without materializing the whole bucket.
const LISTING_LOOKAHEAD: usize = 2;

/// Transfer engine over a source and destination store pair.
pub struct Engine {
    source: Arc<dyn SourceStore>,
    dest: Arc<dyn DestStore>,
    config: Arc<SyncConfig>,
    events: Option<EventSender>,
}

impl Engine {
    /// Create an engine. Fails fast on an invalid configuration, before
    /// any transfer can start.
    pub fn new(
        source: Arc<dyn SourceStore>,
        dest: Arc<dyn DestStore>,
        config: SyncConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            dest,
            config: Arc::new(config),
            events: None,
        })
    }

    /// Subscribe a consumer to structured run events.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: TransferEvent) {
        if let Some(ref tx) = self.events {
            let _ = tx.send(event);
        }
    }

    /// Enumerate the objects a run would transfer, without moving bytes.
    pub async fn plan(&self) -> Result<Vec<ObjectDescriptor>> {
        let lister = Lister::new(
            self.source.clone(),
            &self.config.source.bucket,
            &self.config.transfer.prefix,
        );
        let mut rx = lister.spawn(self.config.transfer.get_max_workers() + LISTING_LOOKAHEAD);

        let mut descriptors = Vec::new();
        while let Some(item) = rx.recv().await {
            descriptors.push(item?);
        }
        Ok(descriptors)
    }

    /// Run the transfer to completion and return the summary.
    ///
    /// Cancellation is cooperative: once `cancel` fires, no further
    /// descriptors are dispatched, in-flight pipelines run to completion,
    /// and the rest of the listing is counted as `not_attempted`.
    pub async fn run(&self, cancel: CancellationToken) -> Result<TransferSummary> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let workers = self.config.transfer.get_max_workers();

        info!(
            "Starting transfer run {}: {} -> {} (prefix: {:?}, workers: {}, action: {})",
            run_id,
            self.config.source.bucket,
            self.config.destination.bucket,
            self.config.transfer.prefix,
            workers,
            if self.config.transfer.delete_source {
                "move"
            } else {
                "copy"
            },
        );

        let lister = Lister::new(
            self.source.clone(),
            &self.config.source.bucket,
            &self.config.transfer.prefix,
        );
        let mut descriptors = lister.spawn(workers + LISTING_LOOKAHEAD);

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut handles: Vec<(String, JoinHandle<TransferOutcome>)> = Vec::new();
        let mut not_attempted = 0usize;
        let mut fatal: Option<SyncError> = None;

        while let Some(item) = descriptors.recv().await {
            let descriptor = match item {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    // A listing failure is fatal for the run; stop pulling
                    // and let in-flight workers finish below.
                    fatal = Some(e);
                    break;
                }
            };

            if cancel.is_cancelled() {
                // Keep draining so the summary can report how much of the
                // listing was never attempted.
                not_attempted += 1;
                continue;
            }

            let permit = semaphore.clone().acquire_owned().await.unwrap();
            self.emit(TransferEvent::ObjectStarted {
                key: descriptor.key.clone(),
            });

            let source = self.source.clone();
            let dest = self.dest.clone();
            let config = self.config.clone();
            let events = self.events.clone();
            let key = descriptor.key.clone();

            let handle = tokio::spawn(async move {
                let outcome = transfer_object(source, dest, config, descriptor).await;
                drop(permit);
                if let Some(tx) = events {
                    let _ = tx.send(TransferEvent::ObjectFinished(outcome.clone()));
                }
                outcome
            });

            handles.push((key, handle));
        }

        if cancel.is_cancelled() && not_attempted > 0 {
            info!(
                "Cancellation requested: {} listed objects not attempted",
                not_attempted
            );
        }

        // Wait for every dispatched worker, even after cancellation or a
        // listing failure: no half-finished pipelines.
        let mut aggregator = Aggregator::new();
        for (key, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("{}: worker task panicked: {}", key, e);
                    TransferOutcome::worker_failed(key, format!("task panicked: {}", e))
                }
            };
            if outcome.status == TransferStatus::Failed {
                if let Some(ref detail) = outcome.error {
                    warn!("{}: failed - {}", outcome.key, detail);
                }
            }
            aggregator.fold(outcome);
        }

        if let Some(e) = fatal {
            error!("Listing failed, aborting run {}: {}", run_id, e);
            return Err(e);
        }

        let summary = aggregator.finalize(run_id, started_at, not_attempted);
        info!(
            "Run {} complete: {} objects ({} transferred, {} skipped, {} failed, {} not attempted), {} bytes in {:.1}s",
            summary.run_id,
            summary.total_objects,
            summary.transferred,
            summary.skipped,
            summary.failed,
            summary.not_attempted,
            summary.bytes_transferred,
            summary.duration_seconds,
        );

        self.emit(TransferEvent::RunCompleted(summary.clone()));
        Ok(summary)
    }
}
