//! # objsync
//!
//! Concurrent bucket-to-bucket object transfer engine.
//!
//! The engine lists a source bucket, decides which objects need transfer,
//! streams each one through a local buffer, verifies integrity, optionally
//! deletes the source object, and aggregates per-object outcomes into a
//! final [`TransferSummary`]:
//!
//! - **Lazy listing** with backend pagination hidden behind a stream
//! - **Bounded worker pool** of `max_workers` concurrent pipelines
//! - **Skip/resume** via destination existence checks
//! - **Checksum verification** before anything reaches the destination
//! - **Move semantics** with delete-after-confirmed-upload
//!
//! Storage backends are opaque collaborators behind the [`SourceStore`] and
//! [`DestStore`] traits; a directory-backed [`FsStore`] and an in-memory
//! [`MemoryStore`] ship with the crate.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use objsync::{Engine, FsStore, SyncConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> objsync::Result<()> {
//!     let config = SyncConfig::load("objsync.yaml")?;
//!     let source = Arc::new(FsStore::new(&config.source.root));
//!     let dest = Arc::new(FsStore::new(&config.destination.root));
//!     let engine = Engine::new(source, dest, config)?;
//!     let summary = engine.run(CancellationToken::new()).await?;
//!     println!("Transferred {} objects", summary.transferred);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod list;
pub mod store;
pub mod transfer;

// Re-exports for convenient access
pub use config::{DestConfig, SourceConfig, SyncConfig, TransferOptions};
pub use engine::{Engine, FailedObject, TransferSummary};
pub use error::{Result, SyncError};
pub use events::{EventReceiver, EventSender, TransferEvent};
pub use list::Lister;
pub use store::{DestStore, FsStore, ListPage, MemoryStore, ObjectDescriptor, SourceStore};
pub use transfer::{ErrorKind, ObjectError, TransferOutcome, TransferStatus};
