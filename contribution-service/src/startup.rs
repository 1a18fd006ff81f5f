//! Application wiring and lifecycle.
//!
//! Builds the stores, the submission pipeline and the profile observers, then
//! serves the HTTP surface until the shutdown token fires.

use crate::config::ContributionConfig;
use crate::handlers;
use crate::observers::{DocumentListAggregator, TracingBadgeRenderer, UnreadCounterObserver};
use crate::pipeline::{PipelineSettings, SimulatedTransfer, SubmissionPipeline};
use crate::services::{
    LocalDb, MetadataStore, MockMetadataStore, MongoMetadataStore, NotificationStore,
    PublishedDocuments, WatchQuery,
};
use axum::{
    routing::{delete, get, post},
    Router,
};
use service_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: ContributionConfig,
    pub pipeline: SubmissionPipeline,
    pub local_db: LocalDb,
    pub metadata: Arc<dyn MetadataStore>,
    pub published: PublishedDocuments,
    pub aggregator: Arc<DocumentListAggregator>,
    pub shutdown: CancellationToken,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: ContributionConfig) -> Result<Self, AppError> {
        let metadata: Arc<dyn MetadataStore> = match config.mongodb.uri.as_deref() {
            Some(uri) => {
                let store = MongoMetadataStore::connect(
                    uri,
                    &config.mongodb.database,
                    &config.mongodb.collection,
                )
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to MongoDB: {}", e);
                    e
                })?;
                store.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;
                Arc::new(store)
            }
            None => {
                tracing::warn!("MONGODB_URI not set, using in-memory metadata store");
                Arc::new(MockMetadataStore::new())
            }
        };

        Self::build_with_metadata_store(config, metadata).await
    }

    pub async fn build_with_metadata_store(
        config: ContributionConfig,
        metadata: Arc<dyn MetadataStore>,
    ) -> Result<Self, AppError> {
        let local_db = LocalDb::connect(&config.sqlite.url, config.sqlite.max_connections)
            .await
            .map_err(|e| {
                tracing::error!("Failed to open local database: {}", e);
                e
            })?;

        let shutdown = CancellationToken::new();

        let pipeline = SubmissionPipeline::new(
            metadata.clone(),
            Arc::new(local_db.clone()),
            Arc::new(SimulatedTransfer::new(config.upload.transfer_delay())),
            PipelineSettings {
                author_id: config.upload.author_id.clone(),
                remote_timeout: config.upload.remote_timeout(),
                event_capacity: config.upload.event_capacity,
            },
        );

        let published = PublishedDocuments::new(metadata.clone(), config.upload.author_id.clone());
        if let Err(e) = published.refresh().await {
            tracing::warn!("Initial published documents load failed: {}", e);
        }
        published.spawn_refresh_loop(config.profile.published_refresh(), shutdown.child_token());
        spawn_refresh_on_success(&pipeline, &published, shutdown.child_token());

        let saved = WatchQuery::new(local_db.saved_documents_stream());
        let downloaded = WatchQuery::new(local_db.downloaded_documents_stream());
        let aggregator = Arc::new(DocumentListAggregator::spawn(
            &published,
            &saved,
            &downloaded,
            shutdown.child_token(),
        ));

        UnreadCounterObserver::spawn(
            local_db.unread_count_stream(),
            Arc::new(TracingBadgeRenderer),
            shutdown.child_token(),
        );

        let state = AppState {
            config: config.clone(),
            pipeline: pipeline.clone(),
            local_db,
            metadata,
            published,
            aggregator,
            shutdown: shutdown.clone(),
        };

        let app = router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            pipeline.shutdown();
            tracing::info!("Contribution service shutting down");
        });

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local_db(&self) -> &LocalDb {
        &self.state.local_db
    }

    pub fn pipeline(&self) -> &SubmissionPipeline {
        &self.state.pipeline
    }

    /// Cancelling this token stops the server, the observers and any upload.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/api/uploads", post(handlers::submit_upload))
        .route("/api/uploads/status", get(handlers::upload_status))
        .route("/api/uploads/events", get(handlers::upload_events))
        .route("/api/notifications", get(handlers::list_notifications))
        .route("/api/notifications/unread", get(handlers::unread_count))
        .route("/api/notifications/read-all", post(handlers::mark_all_read))
        .route("/api/notifications/:id/read", post(handlers::mark_read))
        .route("/api/notifications/:id", delete(handlers::delete_notification))
        .route(
            "/api/profile/documents/:tab",
            get(handlers::list_documents).post(handlers::add_to_shelf),
        )
        .route(
            "/api/profile/documents/:tab/:id",
            delete(handlers::delete_document),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Refreshes the published list whenever an upload succeeds.
fn spawn_refresh_on_success(
    pipeline: &SubmissionPipeline,
    published: &PublishedDocuments,
    cancel: CancellationToken,
) {
    let mut events = pipeline.terminal_events();
    let published = published.clone();

    tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                received = events.recv() => received,
            };

            match received {
                Ok(event) if event.outcome.is_success() => {
                    if let Err(e) = published.refresh().await {
                        tracing::warn!(error = %e, "Failed to refresh published documents");
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Missed upload events, refreshing");
                    if let Err(e) = published.refresh().await {
                        tracing::warn!(error = %e, "Failed to refresh published documents");
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
