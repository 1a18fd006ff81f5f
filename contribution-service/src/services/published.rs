//! Live query over the current author's published documents.

use crate::models::DocumentItem;
use crate::services::live_query::LiveQuery;
use crate::services::metadata_store::MetadataStore;
use futures::stream::{BoxStream, StreamExt};
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct PublishedDocuments {
    store: Arc<dyn MetadataStore>,
    author_id: String,
    tx: Arc<watch::Sender<Vec<DocumentItem>>>,
    // Serializes list-then-publish so a slow read never replaces a newer one.
    refresh_lock: Arc<Mutex<()>>,
}

impl PublishedDocuments {
    pub fn new(store: Arc<dyn MetadataStore>, author_id: impl Into<String>) -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self {
            store,
            author_id: author_id.into(),
            tx: Arc::new(tx),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Re-reads the author's documents and publishes them if they changed.
    pub async fn refresh(&self) -> Result<(), AppError> {
        let _guard = self.refresh_lock.lock().await;
        let items: Vec<DocumentItem> = self
            .store
            .list_by_author(&self.author_id)
            .await?
            .iter()
            .map(DocumentItem::from)
            .collect();

        self.tx.send_if_modified(|current| {
            if *current == items {
                return false;
            }
            *current = items;
            true
        });
        Ok(())
    }

    /// Deletes one of the author's documents and refreshes the list.
    pub async fn delete(&self, document_id: &str) -> Result<bool, AppError> {
        let deleted = self.store.delete(document_id).await?;
        if deleted {
            tracing::info!(document_id = %document_id, "Published document deleted");
            self.refresh().await?;
        }
        Ok(deleted)
    }

    pub fn current(&self) -> Vec<DocumentItem> {
        self.tx.borrow().clone()
    }

    /// Refreshes on every `interval` tick until `cancel` fires.
    pub fn spawn_refresh_loop(
        &self,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => {
                        tracing::info!("Published documents refresher shutting down");
                        break;
                    }

                    _ = ticker.tick() => {
                        if let Err(e) = this.refresh().await {
                            tracing::warn!(error = %e, "Failed to refresh published documents");
                        }
                    }
                }
            }
        })
    }
}

impl LiveQuery<DocumentItem> for PublishedDocuments {
    fn subscribe(&self) -> BoxStream<'static, Vec<DocumentItem>> {
        WatchStream::new(self.tx.subscribe()).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentMetadata, NewDocument};
    use crate::services::MockMetadataStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    /// Holds its first listing until released, after taking the snapshot.
    struct StallingStore {
        inner: MockMetadataStore,
        stalled: AtomicBool,
        snapshot_taken: Notify,
        release: Notify,
    }

    impl StallingStore {
        fn new() -> Self {
            Self {
                inner: MockMetadataStore::new(),
                stalled: AtomicBool::new(false),
                snapshot_taken: Notify::new(),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl MetadataStore for StallingStore {
        async fn create(&self, document: &NewDocument) -> Result<String, AppError> {
            self.inner.create(document).await
        }

        async fn list_by_author(&self, author_id: &str) -> Result<Vec<DocumentMetadata>, AppError> {
            let snapshot = self.inner.list_by_author(author_id).await?;
            if !self.stalled.swap(true, Ordering::SeqCst) {
                self.snapshot_taken.notify_one();
                self.release.notified().await;
            }
            Ok(snapshot)
        }

        async fn delete(&self, document_id: &str) -> Result<bool, AppError> {
            self.inner.delete(document_id).await
        }

        async fn health_check(&self) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn refresh_publishes_author_documents() {
        let store = Arc::new(MockMetadataStore::new());
        store
            .create(&NewDocument::new("Mine".into(), None, "user_001".into()))
            .await
            .unwrap();
        store
            .create(&NewDocument::new("Theirs".into(), None, "user_002".into()))
            .await
            .unwrap();

        let published = PublishedDocuments::new(store.clone(), "user_001");
        let mut stream = published.subscribe();
        assert_eq!(stream.next().await, Some(vec![]));

        published.refresh().await.unwrap();
        let items = stream.next().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Mine");
    }

    #[tokio::test]
    async fn delete_refreshes_only_when_something_was_removed() {
        let store = Arc::new(MockMetadataStore::new());
        let id = store
            .create(&NewDocument::new("Mine".into(), None, "user_001".into()))
            .await
            .unwrap();
        let published = PublishedDocuments::new(store.clone(), "user_001");
        published.refresh().await.unwrap();
        assert_eq!(published.current().len(), 1);

        assert!(!published.delete("doc_missing").await.unwrap());
        assert_eq!(store.list_calls(), 1);

        assert!(published.delete(&id).await.unwrap());
        assert!(published.current().is_empty());
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn slow_refresh_never_overwrites_a_newer_list() {
        let store = Arc::new(StallingStore::new());
        let published = PublishedDocuments::new(store.clone(), "user_001");

        let slow = tokio::spawn({
            let published = published.clone();
            async move { published.refresh().await }
        });
        store.snapshot_taken.notified().await;

        store
            .create(&NewDocument::new("Fresh".into(), None, "user_001".into()))
            .await
            .unwrap();
        let fresh = tokio::spawn({
            let published = published.clone();
            async move { published.refresh().await }
        });
        tokio::task::yield_now().await;

        store.release.notify_one();
        slow.await.unwrap().unwrap();
        fresh.await.unwrap().unwrap();

        let items = published.current();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Fresh");
    }
}
