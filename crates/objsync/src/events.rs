//! Narrow notification interface.
//!
//! The engine reports progress through an optional channel of events,
//! keeping it free of any dependency on log formatting or destinations.
//! Consumers (progress bars, structured reporters) subscribe with
//! [`Engine::with_events`](crate::engine::Engine::with_events).

use tokio::sync::mpsc;

use crate::engine::TransferSummary;
use crate::transfer::TransferOutcome;

/// Structured events emitted during a run.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    /// An object was dispatched to a worker.
    ObjectStarted { key: String },

    /// An object's pipeline finished, in completion order.
    ObjectFinished(TransferOutcome),

    /// The run completed and the summary is final.
    RunCompleted(TransferSummary),
}

/// Sending half of the event channel.
pub type EventSender = mpsc::UnboundedSender<TransferEvent>;

/// Receiving half of the event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<TransferEvent>;

/// Create an event channel for [`Engine::with_events`](crate::engine::Engine::with_events).
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
