//! Local relational store (SQLite via sqlx).
//!
//! Holds notifications plus the saved and downloaded shelves. Every live query
//! is a `watch` channel republished after each mutation, so consumers always
//! see the latest value and never a backlog.

use crate::models::{
    DocumentItem, NewLibraryEntry, NewNotification, NotificationRecord, NotificationRow,
    SavedDocument,
};
use crate::services::metrics::record_notification_insert;
use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqlitePoolOptions};
use sqlx::Transaction;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{info, instrument};

const UNREAD_COUNT_SQL: &str = "SELECT COUNT(*) FROM notifications WHERE is_read = 0";

/// Contract the submission pipeline and the unread counter depend on.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: &NewNotification) -> Result<NotificationRecord, AppError>;

    /// Live unread count. The receiver only ever holds the latest value.
    fn unread_count_stream(&self) -> watch::Receiver<i64>;
}

#[derive(Clone)]
pub struct LocalDb {
    pool: SqlitePool,
    unread_tx: Arc<watch::Sender<i64>>,
    saved_tx: Arc<watch::Sender<Vec<SavedDocument>>>,
    downloaded_tx: Arc<watch::Sender<Vec<DocumentItem>>>,
    // Serializes query-then-publish so an older snapshot never overwrites a newer one.
    publish_lock: Arc<Mutex<()>>,
}

impl LocalDb {
    /// Opens the pool, runs migrations and seeds every live query.
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        info!(max_connections = max_connections, "Opening SQLite database");

        let options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(30));

        // An in-memory database lives only as long as its single connection.
        let options = if database_url.contains(":memory:") {
            options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options.max_connections(max_connections)
        };

        let pool = options
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        let (unread_tx, _) = watch::channel(0);
        let (saved_tx, _) = watch::channel(Vec::new());
        let (downloaded_tx, _) = watch::channel(Vec::new());

        let db = Self {
            pool,
            unread_tx: Arc::new(unread_tx),
            saved_tx: Arc::new(saved_tx),
            downloaded_tx: Arc::new(downloaded_tx),
            publish_lock: Arc::new(Mutex::new(())),
        };

        db.run_migrations().await?;
        let unread = db.unread_count().await?;
        db.publish_unread_count(unread);
        db.publish_saved().await?;
        db.publish_downloaded().await?;

        info!("SQLite database ready");
        Ok(db)
    }

    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Notifications
    // -------------------------------------------------------------------------

    #[instrument(skip(self, notification), fields(kind = %notification.kind))]
    pub async fn insert_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<NotificationRecord, AppError> {
        let _guard = self.publish_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (title, message, time_text, kind, is_read, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            RETURNING id, title, message, time_text, kind, is_read, created_at
            "#,
        )
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.time_text)
        .bind(notification.kind.to_string())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert notification: {}", e);
            AppError::DatabaseError(anyhow::anyhow!("Failed to insert notification: {}", e))
        })?;

        let record = NotificationRecord::try_from(row).map_err(AppError::DatabaseError)?;
        let unread = Self::count_unread(&mut tx).await?;
        tx.commit().await?;

        record_notification_insert(&record.kind.to_string());
        info!(notification_id = record.id, "Notification stored");

        self.publish_unread_count(unread);
        Ok(record)
    }

    /// All notifications, newest first.
    pub async fn list_notifications(&self) -> Result<Vec<NotificationRecord>, AppError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, title, message, time_text, kind, is_read, created_at
            FROM notifications
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| NotificationRecord::try_from(row).map_err(AppError::DatabaseError))
            .collect()
    }

    pub async fn unread_count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(UNREAD_COUNT_SQL)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn mark_read(&self, id: i64) -> Result<bool, AppError> {
        let affected = self
            .mutate_notifications(
                sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?").bind(id),
            )
            .await?;
        Ok(affected > 0)
    }

    pub async fn mark_all_read(&self) -> Result<u64, AppError> {
        self.mutate_notifications(sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE is_read = 0",
        ))
        .await
    }

    pub async fn delete_notification(&self, id: i64) -> Result<bool, AppError> {
        let affected = self
            .mutate_notifications(sqlx::query("DELETE FROM notifications WHERE id = ?").bind(id))
            .await?;
        Ok(affected > 0)
    }

    /// Runs `statement` and reads the new unread count in one transaction, so
    /// nothing can fail once the change is committed.
    async fn mutate_notifications<'q>(
        &self,
        statement: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Result<u64, AppError> {
        let _guard = self.publish_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let affected = statement.execute(&mut *tx).await?.rows_affected();
        let unread = Self::count_unread(&mut tx).await?;
        tx.commit().await?;

        self.publish_unread_count(unread);
        Ok(affected)
    }

    async fn count_unread(tx: &mut Transaction<'_, Sqlite>) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(UNREAD_COUNT_SQL)
            .fetch_one(&mut **tx)
            .await?;
        Ok(count)
    }

    fn publish_unread_count(&self, count: i64) {
        self.unread_tx.send_if_modified(|current| {
            if *current == count {
                return false;
            }
            *current = count;
            true
        });
    }

    // -------------------------------------------------------------------------
    // Saved shelf
    // -------------------------------------------------------------------------

    pub async fn save_document(&self, entry: &NewLibraryEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO saved_documents (document_id, title, meta_info, saved_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (document_id) DO UPDATE SET title = excluded.title, meta_info = excluded.meta_info
            "#,
        )
        .bind(&entry.document_id)
        .bind(&entry.title)
        .bind(&entry.meta_info)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        self.publish_saved().await
    }

    pub async fn remove_saved(&self, document_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM saved_documents WHERE document_id = ?")
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        self.publish_saved().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_saved(&self) -> Result<Vec<SavedDocument>, AppError> {
        let saved = sqlx::query_as::<_, SavedDocument>(
            "SELECT document_id, title, meta_info, saved_at FROM saved_documents ORDER BY saved_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(saved)
    }

    pub fn saved_documents_stream(&self) -> watch::Receiver<Vec<SavedDocument>> {
        self.saved_tx.subscribe()
    }

    async fn publish_saved(&self) -> Result<(), AppError> {
        let _guard = self.publish_lock.lock().await;
        let saved = self.list_saved().await?;
        self.saved_tx.send_replace(saved);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Downloaded shelf
    // -------------------------------------------------------------------------

    pub async fn record_download(&self, entry: &NewLibraryEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO downloaded_documents (document_id, title, meta_info, downloaded_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (document_id) DO UPDATE SET downloaded_at = excluded.downloaded_at
            "#,
        )
        .bind(&entry.document_id)
        .bind(&entry.title)
        .bind(&entry.meta_info)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        self.publish_downloaded().await
    }

    pub async fn list_downloaded(&self) -> Result<Vec<DocumentItem>, AppError> {
        let items = sqlx::query_as::<_, DocumentItem>(
            r#"
            SELECT document_id AS id, title, meta_info AS meta
            FROM downloaded_documents
            ORDER BY downloaded_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub fn downloaded_documents_stream(&self) -> watch::Receiver<Vec<DocumentItem>> {
        self.downloaded_tx.subscribe()
    }

    async fn publish_downloaded(&self) -> Result<(), AppError> {
        let _guard = self.publish_lock.lock().await;
        let items = self.list_downloaded().await?;
        self.downloaded_tx.send_replace(items);
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for LocalDb {
    async fn insert(&self, notification: &NewNotification) -> Result<NotificationRecord, AppError> {
        self.insert_notification(notification).await
    }

    fn unread_count_stream(&self) -> watch::Receiver<i64> {
        self.unread_tx.subscribe()
    }
}
