use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Largest count shown as digits.
pub const BADGE_CAP: i64 = 99;

/// Display state of the unread-notification badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "count", rename_all = "lowercase")]
pub enum UnreadBadge {
    Hidden,
    Count(i64),
    Capped,
}

impl UnreadBadge {
    pub fn from_count(count: i64) -> Self {
        if count <= 0 {
            UnreadBadge::Hidden
        } else if count <= BADGE_CAP {
            UnreadBadge::Count(count)
        } else {
            UnreadBadge::Capped
        }
    }

    /// Text to show, or `None` when the badge is hidden.
    pub fn label(&self) -> Option<String> {
        match self {
            UnreadBadge::Hidden => None,
            UnreadBadge::Count(count) => Some(count.to_string()),
            UnreadBadge::Capped => Some(format!("{}+", BADGE_CAP)),
        }
    }
}

#[async_trait]
pub trait BadgeRenderer: Send + Sync {
    async fn render(&self, badge: &UnreadBadge);
}

/// Renders the badge as a log line.
pub struct TracingBadgeRenderer;

#[async_trait]
impl BadgeRenderer for TracingBadgeRenderer {
    async fn render(&self, badge: &UnreadBadge) {
        match badge.label() {
            Some(label) => tracing::info!(badge = %label, "Unread notifications"),
            None => tracing::debug!("Unread badge hidden"),
        }
    }
}

/// Renders the live unread count with latest-wins semantics: counts that
/// arrive while a render is running are collapsed into the newest one.
pub struct UnreadCounterObserver;

impl UnreadCounterObserver {
    pub fn spawn(
        mut counts: watch::Receiver<i64>,
        renderer: Arc<dyn BadgeRenderer>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let initial = *counts.borrow_and_update();
            renderer.render(&UnreadBadge::from_count(initial)).await;

            loop {
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => {
                        tracing::debug!("Unread counter observer shutting down");
                        break;
                    }

                    changed = counts.changed() => {
                        if changed.is_err() {
                            tracing::debug!("Unread count source closed");
                            break;
                        }
                        let count = *counts.borrow_and_update();
                        renderer.render(&UnreadBadge::from_count(count)).await;
                    }
                }
            }
        })
    }
}
