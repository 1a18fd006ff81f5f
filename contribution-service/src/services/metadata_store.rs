//! Remote document metadata store.
//!
//! The production backend is a MongoDB collection; [`MockMetadataStore`] keeps
//! documents in memory and is used by tests and by dev runs without MongoDB.

use crate::models::{DocumentMetadata, NewDocument};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Persists a new document and returns the identifier the store assigned.
    async fn create(&self, document: &NewDocument) -> Result<String, AppError>;
    /// Documents by one author, newest first.
    async fn list_by_author(&self, author_id: &str) -> Result<Vec<DocumentMetadata>, AppError>;
    /// Returns false when no document had that id.
    async fn delete(&self, document_id: &str) -> Result<bool, AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    title: String,
    description: Option<String>,
    #[serde(rename = "authorId")]
    author_id: String,
    #[serde(rename = "uploadTime")]
    upload_time: i64,
}

impl From<&NewDocument> for DocumentRecord {
    fn from(doc: &NewDocument) -> Self {
        Self {
            id: None,
            title: doc.title.clone(),
            description: doc.description.clone(),
            author_id: doc.author_id.clone(),
            upload_time: doc.upload_time,
        }
    }
}

impl DocumentRecord {
    fn into_metadata(self) -> Option<DocumentMetadata> {
        Some(DocumentMetadata {
            id: self.id?.to_hex(),
            title: self.title,
            description: self.description,
            author_id: self.author_id,
            upload_time: self.upload_time,
        })
    }
}

#[derive(Clone)]
pub struct MongoMetadataStore {
    client: MongoClient,
    db: Database,
    collection: String,
}

impl MongoMetadataStore {
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self {
            client,
            db,
            collection: collection.to_string(),
        })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for contribution-service");

        // Profile lists query by author, newest first
        let author_index = IndexModel::builder()
            .keys(doc! { "authorId": 1, "uploadTime": -1 })
            .options(
                IndexOptions::builder()
                    .name("author_upload_time_idx".to_string())
                    .build(),
            )
            .build();

        self.documents()
            .create_index(author_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create author index: {}", e);
                AppError::from(e)
            })?;

        tracing::info!("Created index on documents.(authorId, uploadTime)");
        Ok(())
    }

    fn documents(&self) -> Collection<DocumentRecord> {
        self.db.collection(&self.collection)
    }
}

#[async_trait]
impl MetadataStore for MongoMetadataStore {
    async fn create(&self, document: &NewDocument) -> Result<String, AppError> {
        let result = self
            .documents()
            .insert_one(DocumentRecord::from(document), None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert document metadata: {}", e);
                AppError::from(e)
            })?;

        result
            .inserted_id
            .as_object_id()
            .map(|oid| oid.to_hex())
            .ok_or_else(|| {
                AppError::DatabaseError(anyhow::anyhow!(
                    "MongoDB returned a non-ObjectId identifier: {}",
                    result.inserted_id
                ))
            })
    }

    async fn list_by_author(&self, author_id: &str) -> Result<Vec<DocumentMetadata>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "uploadTime": -1 })
            .build();

        let records: Vec<DocumentRecord> = self
            .documents()
            .find(doc! { "authorId": author_id }, options)
            .await?
            .try_collect()
            .await?;

        Ok(records
            .into_iter()
            .filter_map(DocumentRecord::into_metadata)
            .collect())
    }

    async fn delete(&self, document_id: &str) -> Result<bool, AppError> {
        let Ok(oid) = ObjectId::parse_str(document_id) else {
            return Ok(false);
        };

        let result = self
            .documents()
            .delete_one(doc! { "_id": oid }, None)
            .await
            .map_err(|e| {
                tracing::error!(document_id = %document_id, "Failed to delete document: {}", e);
                AppError::from(e)
            })?;

        Ok(result.deleted_count > 0)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}

/// In-memory metadata store for testing
pub struct MockMetadataStore {
    documents: RwLock<Vec<DocumentMetadata>>,
    failure: RwLock<Option<String>>,
    create_delay: Option<Duration>,
    next_id: AtomicU64,
    create_calls: AtomicU64,
    list_calls: AtomicU64,
}

impl Default for MockMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMetadataStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            failure: RwLock::new(None),
            create_delay: None,
            next_id: AtomicU64::new(1),
            create_calls: AtomicU64::new(0),
            list_calls: AtomicU64::new(0),
        }
    }

    /// Delays every `create` call, for exercising write timeouts.
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    /// Starts numbering generated ids from `next`, giving `doc_<next>`.
    pub fn with_next_id(self, next: u64) -> Self {
        self.next_id.store(next, Ordering::SeqCst);
        self
    }

    /// Makes every subsequent write fail with `message`; `None` restores writes.
    pub async fn fail_writes(&self, message: Option<&str>) {
        *self.failure.write().await = message.map(str::to_string);
    }

    pub async fn documents(&self) -> Vec<DocumentMetadata> {
        self.documents.read().await.clone()
    }

    pub fn create_calls(&self) -> u64 {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataStore for MockMetadataStore {
    async fn create(&self, document: &NewDocument) -> Result<String, AppError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.failure.read().await.clone() {
            return Err(AppError::DatabaseError(anyhow::anyhow!(message)));
        }

        let id = format!("doc_{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        tracing::info!(document_id = %id, title = %document.title, "[MOCK] Document metadata stored");
        self.documents
            .write()
            .await
            .push(document.clone().into_metadata(id.clone()));
        Ok(id)
    }

    async fn list_by_author(&self, author_id: &str) -> Result<Vec<DocumentMetadata>, AppError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let mut docs: Vec<DocumentMetadata> = self
            .documents
            .read()
            .await
            .iter()
            .filter(|d| d.author_id == author_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.upload_time.cmp(&a.upload_time));
        Ok(docs)
    }

    async fn delete(&self, document_id: &str) -> Result<bool, AppError> {
        if let Some(message) = self.failure.read().await.clone() {
            return Err(AppError::DatabaseError(anyhow::anyhow!(message)));
        }

        let mut docs = self.documents.write().await;
        let before = docs.len();
        docs.retain(|d| d.id != document_id);
        Ok(docs.len() != before)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
