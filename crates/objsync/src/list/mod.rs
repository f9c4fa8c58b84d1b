//! Object lister: lazy, paged enumeration of source-bucket objects.
//!
//! Pagination is an implementation detail hidden behind the channel: a
//! spawned producer walks the backend's listing pages and feeds descriptors
//! into a bounded channel, so an unbounded listing never materializes more
//! descriptors than the scheduler's worker count plus a small lookahead.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::store::{ObjectDescriptor, SourceStore};

/// Streams the listing of one bucket. Consumed by [`spawn`](Lister::spawn);
/// a fresh listing requires a fresh `Lister`.
pub struct Lister {
    source: Arc<dyn SourceStore>,
    bucket: String,
    prefix: String,
}

impl Lister {
    /// Create a lister over `bucket`, filtered by `prefix`.
    pub fn new(source: Arc<dyn SourceStore>, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            source,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Start the producer task and return the descriptor stream.
    ///
    /// The stream yields `Ok(descriptor)` per object in listing order and
    /// terminates after the last page. A listing failure yields a single
    /// `Err(SyncError::List)` and ends the stream; the caller treats it as
    /// fatal for the run. Dropping the receiver stops the producer.
    pub fn spawn(self, capacity: usize) -> mpsc::Receiver<Result<ObjectDescriptor>> {
        let (tx, rx) = mpsc::channel(capacity.max(1));

        tokio::spawn(async move {
            let mut token: Option<String> = None;
            let mut pages = 0usize;
            let mut total = 0usize;

            loop {
                let page = match self
                    .source
                    .list_page(&self.bucket, &self.prefix, token.as_deref())
                    .await
                {
                    Ok(page) => page,
                    Err(e) => {
                        let err = match e {
                            listing @ SyncError::List { .. } => listing,
                            other => SyncError::list(&self.bucket, other.to_string()),
                        };
                        let _ = tx.send(Err(err)).await;
                        return;
                    }
                };

                pages += 1;
                total += page.objects.len();

                for descriptor in page.objects {
                    if tx.send(Ok(descriptor)).await.is_err() {
                        // Receiver gone: run cancelled or aborted.
                        return;
                    }
                }

                match page.next_token {
                    Some(next) => token = Some(next),
                    None => break,
                }
            }

            debug!(
                "{}: listing complete, {} objects in {} pages",
                self.bucket, total, pages
            );
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn drain(mut rx: mpsc::Receiver<Result<ObjectDescriptor>>) -> Vec<Result<ObjectDescriptor>> {
        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn test_streams_all_pages_in_order() {
        let store = Arc::new(MemoryStore::new().with_page_size(3));
        for i in 0..10 {
            store.put_object("src", &format!("key-{:02}", i), vec![0u8; 4]);
        }

        let rx = Lister::new(store as Arc<dyn SourceStore>, "src", "").spawn(2);
        let items = drain(rx).await;

        let keys: Vec<_> = items
            .into_iter()
            .map(|r| r.unwrap().key)
            .collect();
        assert_eq!(keys.len(), 10);
        assert_eq!(keys[0], "key-00");
        assert_eq!(keys[9], "key-09");
    }

    #[tokio::test]
    async fn test_prefix_filters_listing() {
        let store = Arc::new(MemoryStore::new());
        store.put_object("src", "logs/a", vec![1]);
        store.put_object("src", "data/b", vec![2]);

        let rx = Lister::new(store as Arc<dyn SourceStore>, "src", "logs/").spawn(4);
        let items = drain(rx).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().key, "logs/a");
    }

    #[tokio::test]
    async fn test_missing_bucket_yields_list_error() {
        let store = Arc::new(MemoryStore::new());
        let rx = Lister::new(store as Arc<dyn SourceStore>, "ghost", "").spawn(4);
        let items = drain(rx).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(SyncError::List { .. })));
    }

    #[tokio::test]
    async fn test_dropping_receiver_stops_producer() {
        let store = Arc::new(MemoryStore::new().with_page_size(1));
        for i in 0..100 {
            store.put_object("src", &format!("k{}", i), vec![0]);
        }

        let mut rx = Lister::new(store as Arc<dyn SourceStore>, "src", "").spawn(1);
        let first = rx.recv().await.unwrap().unwrap();
        assert!(!first.key.is_empty());
        drop(rx);
        // Producer exits on the closed channel; nothing to assert beyond
        // not hanging.
    }
}
