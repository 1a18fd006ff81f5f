use super::error::{SubmissionError, FALLBACK_ERROR_MESSAGE};
use super::event::{SubmissionEvent, SubmissionOutcome, SUCCESS_MESSAGE};
use super::transfer::TransferStep;
use crate::models::{NewDocument, NewNotification};
use crate::services::metrics::{record_submission, record_submission_rejected};
use crate::services::{MetadataStore, NotificationStore};
use futures::FutureExt;
use service_core::error::AppError;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Validate)]
pub struct SubmissionRequest {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,
    pub description: Option<String>,
}

impl SubmissionRequest {
    /// Trims both fields; a blank description becomes `None`.
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        let title = title.into().trim().to_string();
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        Self { title, description }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Author recorded on every document.
    pub author_id: String,
    /// Upper bound for the remote metadata write.
    pub remote_timeout: Duration,
    /// Per-subscriber slack for terminal events.
    pub event_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            author_id: "user_001".to_string(),
            remote_timeout: Duration::from_secs(30),
            event_capacity: 16,
        }
    }
}

/// Runs upload submissions, at most one at a time.
///
/// A `submit` while another submission is in flight is rejected with
/// [`AppError::Conflict`]. Every accepted submission ends with exactly one
/// [`SubmissionEvent`] on [`terminal_events`](Self::terminal_events); the
/// channel does not replay, so a receiver created after the event fired never
/// sees it.
#[derive(Clone)]
pub struct SubmissionPipeline {
    inner: Arc<Inner>,
}

struct Inner {
    metadata: Arc<dyn MetadataStore>,
    notifications: Arc<dyn NotificationStore>,
    transfer: Arc<dyn TransferStep>,
    settings: PipelineSettings,
    in_flight: AtomicBool,
    uploading_tx: watch::Sender<bool>,
    events_tx: broadcast::Sender<SubmissionEvent>,
    shutdown: CancellationToken,
}

impl SubmissionPipeline {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        notifications: Arc<dyn NotificationStore>,
        transfer: Arc<dyn TransferStep>,
        settings: PipelineSettings,
    ) -> Self {
        let (uploading_tx, _) = watch::channel(false);
        let (events_tx, _) = broadcast::channel(settings.event_capacity.max(1));

        Self {
            inner: Arc::new(Inner {
                metadata,
                notifications,
                transfer,
                settings,
                in_flight: AtomicBool::new(false),
                uploading_tx,
                events_tx,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Starts a submission in the background and returns immediately.
    ///
    /// Must be called from within a Tokio runtime. Errors are synchronous
    /// rejections only; step failures arrive later as an `Error` event.
    pub fn submit(
        &self,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<SubmissionHandle, AppError> {
        let request = SubmissionRequest::new(title, description);
        if let Err(e) = request.validate() {
            record_submission_rejected("invalid");
            return Err(e.into());
        }

        let guard = InFlightGuard::acquire(&self.inner).ok_or_else(|| {
            record_submission_rejected("in_progress");
            tracing::warn!(title = %request.title, "Upload rejected: another upload is in progress");
            AppError::Conflict(anyhow::anyhow!("An upload is already in progress"))
        })?;

        let id = Uuid::new_v4();
        let cancel = self.inner.shutdown.child_token();
        let inner = self.inner.clone();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            // Dropped after the terminal event is sent, on every exit path.
            let _guard = guard;
            inner.execute(id, request, task_cancel).await;
        });

        Ok(SubmissionHandle { id, cancel, task })
    }

    /// Live view of the in-progress flag.
    pub fn is_uploading(&self) -> watch::Receiver<bool> {
        self.inner.uploading_tx.subscribe()
    }

    pub fn uploading(&self) -> bool {
        *self.inner.uploading_tx.borrow()
    }

    /// Subscribes to terminal events fired from now on.
    pub fn terminal_events(&self) -> broadcast::Receiver<SubmissionEvent> {
        self.inner.events_tx.subscribe()
    }

    /// Cancels every in-flight submission; each still emits its terminal event.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }
}

impl Inner {
    async fn execute(&self, id: Uuid, request: SubmissionRequest, cancel: CancellationToken) {
        let started = Instant::now();
        tracing::info!(submission_id = %id, title = %request.title, "Submission started");

        // A run that completes in the same poll as a cancel keeps its result.
        let result = tokio::select! {
            biased;

            result = AssertUnwindSafe(self.run(id, &request)).catch_unwind() => {
                result.unwrap_or_else(|panic| Err(SubmissionError::Unknown(panic_message(panic))))
            }

            _ = cancel.cancelled() => Err(SubmissionError::Cancelled),
        };

        let outcome = match result {
            Ok(document_id) => {
                tracing::info!(
                    submission_id = %id,
                    document_id = %document_id,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Submission succeeded"
                );
                record_submission("success", started.elapsed());
                SubmissionOutcome::Success {
                    message: SUCCESS_MESSAGE.to_string(),
                }
            }
            Err(err) => {
                tracing::error!(
                    submission_id = %id,
                    step = err.step(),
                    error = %err,
                    "Submission failed"
                );
                record_submission("error", started.elapsed());
                SubmissionOutcome::Error {
                    message: err.user_message(),
                }
            }
        };

        self.emit(SubmissionEvent {
            submission_id: id,
            outcome,
        });
    }

    async fn run(&self, id: Uuid, request: &SubmissionRequest) -> Result<String, SubmissionError> {
        self.transfer.transfer(request).await?;
        tracing::debug!(submission_id = %id, "Transfer step finished");

        let document = NewDocument::new(
            request.title.clone(),
            request.description.clone(),
            self.settings.author_id.clone(),
        );

        let document_id = match tokio::time::timeout(
            self.settings.remote_timeout,
            self.metadata.create(&document),
        )
        .await
        {
            Ok(Ok(document_id)) => document_id,
            Ok(Err(e)) => return Err(SubmissionError::RemoteWrite(e.to_string())),
            Err(_) => {
                return Err(SubmissionError::RemoteWrite(format!(
                    "Saving document metadata timed out after {:?}",
                    self.settings.remote_timeout
                )))
            }
        };
        tracing::info!(submission_id = %id, document_id = %document_id, "Document metadata stored");

        let notification = NewNotification::upload_succeeded(&request.title, &document_id);
        self.notifications
            .insert(&notification)
            .await
            .map_err(|e| SubmissionError::LocalWrite(e.to_string()))?;

        Ok(document_id)
    }

    fn emit(&self, event: SubmissionEvent) {
        let submission_id = event.submission_id;
        match self.events_tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(submission_id = %submission_id, receivers, "Terminal event sent")
            }
            Err(_) => {
                tracing::debug!(submission_id = %submission_id, "Terminal event had no subscribers")
            }
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        FALLBACK_ERROR_MESSAGE.to_string()
    }
}

/// Holds the single-flight flag; releasing it also publishes `false`.
struct InFlightGuard {
    inner: Arc<Inner>,
}

impl InFlightGuard {
    fn acquire(inner: &Arc<Inner>) -> Option<Self> {
        inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        inner.uploading_tx.send_replace(true);
        Some(Self {
            inner: inner.clone(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner.in_flight.store(false, Ordering::Release);
        self.inner.uploading_tx.send_replace(false);
    }
}

/// Handle to one accepted submission. Dropping it does not cancel the run.
#[derive(Debug)]
pub struct SubmissionHandle {
    id: Uuid,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SubmissionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stops waiting on the current step and ends the run with an `Error` event.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Resolves once the terminal event is sent and the flag is released.
    pub async fn finished(self) {
        if let Err(e) = self.task.await {
            tracing::warn!(submission_id = %self.id, error = %e, "Submission task did not complete");
        }
    }
}
