//! Result aggregation.
//!
//! The aggregator is the run's only shared mutable state and is reached
//! exclusively from the engine's collection loop, which serializes all
//! writes. Folding is order-independent; `failed_keys` ends up in
//! completion order, not listing order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::transfer::{ObjectError, TransferOutcome, TransferStatus};

/// A failed object with enough detail for a manual retry pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedObject {
    /// Object key.
    pub key: String,

    /// Which step failed and why.
    pub error: ObjectError,
}

/// Final report of a transfer run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSummary {
    /// Unique run identifier.
    pub run_id: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Objects that produced an outcome. Always equals
    /// `transferred + skipped + failed`.
    pub total_objects: usize,

    /// Objects copied (or moved) to the destination.
    pub transferred: usize,

    /// Objects already present in the destination.
    pub skipped: usize,

    /// Objects whose pipeline failed.
    pub failed: usize,

    /// Listed objects never dispatched because the run was cancelled.
    pub not_attempted: usize,

    /// Total bytes written to the destination.
    pub bytes_transferred: u64,

    /// Failed objects in completion order.
    pub failed_keys: Vec<FailedObject>,
}

impl TransferSummary {
    /// Convert to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Accumulates per-object outcomes into counters and the failed list.
#[derive(Debug, Default)]
pub struct Aggregator {
    transferred: usize,
    skipped: usize,
    failed: usize,
    bytes_transferred: u64,
    failed_keys: Vec<FailedObject>,
}

impl Aggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one outcome into the counters.
    pub fn fold(&mut self, outcome: TransferOutcome) {
        self.bytes_transferred += outcome.bytes_transferred;
        match outcome.status {
            TransferStatus::Transferred => self.transferred += 1,
            TransferStatus::Skipped => self.skipped += 1,
            TransferStatus::Failed => {
                self.failed += 1;
                if let Some(error) = outcome.error {
                    self.failed_keys.push(FailedObject {
                        key: outcome.key,
                        error,
                    });
                }
            }
        }
    }

    /// Outcomes folded so far.
    pub fn total(&self) -> usize {
        self.transferred + self.skipped + self.failed
    }

    /// Finalize into a summary once all outcomes are in.
    pub fn finalize(
        self,
        run_id: String,
        started_at: DateTime<Utc>,
        not_attempted: usize,
    ) -> TransferSummary {
        let completed_at = Utc::now();
        let duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        TransferSummary {
            run_id,
            started_at,
            completed_at,
            duration_seconds,
            total_objects: self.transferred + self.skipped + self.failed,
            transferred: self.transferred,
            skipped: self.skipped,
            failed: self.failed,
            not_attempted,
            bytes_transferred: self.bytes_transferred,
            failed_keys: self.failed_keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::ErrorKind;

    fn outcome(key: &str, status: TransferStatus, bytes: u64) -> TransferOutcome {
        TransferOutcome {
            key: key.to_string(),
            status,
            bytes_transferred: bytes,
            error: match status {
                TransferStatus::Failed => Some(ObjectError {
                    kind: ErrorKind::Download,
                    message: "boom".into(),
                }),
                _ => None,
            },
            duration_ms: 1,
        }
    }

    #[test]
    fn test_counts_add_up() {
        let mut agg = Aggregator::new();
        agg.fold(outcome("a", TransferStatus::Transferred, 10));
        agg.fold(outcome("b", TransferStatus::Skipped, 0));
        agg.fold(outcome("c", TransferStatus::Failed, 0));
        agg.fold(outcome("d", TransferStatus::Transferred, 20));

        let summary = agg.finalize("run".into(), Utc::now(), 0);
        assert_eq!(summary.total_objects, 4);
        assert_eq!(summary.transferred, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.bytes_transferred, 30);
        assert_eq!(
            summary.total_objects,
            summary.transferred + summary.skipped + summary.failed
        );
    }

    #[test]
    fn test_failed_keys_in_fold_order() {
        let mut agg = Aggregator::new();
        agg.fold(outcome("z", TransferStatus::Failed, 0));
        agg.fold(outcome("a", TransferStatus::Failed, 0));

        let summary = agg.finalize("run".into(), Utc::now(), 0);
        let keys: Vec<_> = summary.failed_keys.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_summary_serializes() {
        let agg = Aggregator::new();
        let summary = agg.finalize("run".into(), Utc::now(), 3);
        let json = summary.to_json().unwrap();
        assert!(json.contains("\"not_attempted\": 3"));
    }
}
