use crate::models::{DocumentItem, SavedDocument};
use crate::services::LiveQuery;
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileTab {
    #[default]
    Published,
    Saved,
    Downloaded,
}

impl ProfileTab {
    /// Out-of-range indices select the published tab.
    pub fn from_index(index: usize) -> Self {
        match index {
            1 => ProfileTab::Saved,
            2 => ProfileTab::Downloaded,
            _ => ProfileTab::Published,
        }
    }

    pub fn index(self) -> usize {
        match self {
            ProfileTab::Published => 0,
            ProfileTab::Saved => 1,
            ProfileTab::Downloaded => 2,
        }
    }
}

impl std::fmt::Display for ProfileTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileTab::Published => write!(f, "published"),
            ProfileTab::Saved => write!(f, "saved"),
            ProfileTab::Downloaded => write!(f, "downloaded"),
        }
    }
}

impl FromStr for ProfileTab {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(ProfileTab::Published),
            "saved" => Ok(ProfileTab::Saved),
            "downloaded" => Ok(ProfileTab::Downloaded),
            other => Err(anyhow::anyhow!("unknown profile tab '{}'", other)),
        }
    }
}

#[derive(Default)]
struct TabCache {
    active: ProfileTab,
    published: Vec<DocumentItem>,
    saved: Vec<DocumentItem>,
    downloaded: Vec<DocumentItem>,
}

impl TabCache {
    fn slot(&mut self, tab: ProfileTab) -> &mut Vec<DocumentItem> {
        match tab {
            ProfileTab::Published => &mut self.published,
            ProfileTab::Saved => &mut self.saved,
            ProfileTab::Downloaded => &mut self.downloaded,
        }
    }

    fn get(&self, tab: ProfileTab) -> &[DocumentItem] {
        match tab {
            ProfileTab::Published => &self.published,
            ProfileTab::Saved => &self.saved,
            ProfileTab::Downloaded => &self.downloaded,
        }
    }
}

struct Shared {
    cache: Mutex<TabCache>,
    visible_tx: watch::Sender<Vec<DocumentItem>>,
}

impl Shared {
    fn cache(&self) -> MutexGuard<'_, TabCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn store(&self, tab: ProfileTab, items: Vec<DocumentItem>) {
        let mut cache = self.cache();
        *cache.slot(tab) = items;
        if cache.active == tab {
            let items = cache.get(tab);
            self.visible_tx.send_if_modified(|visible| {
                if visible.as_slice() == items {
                    return false;
                }
                *visible = items.to_vec();
                true
            });
        }
    }
}

/// Keeps the three profile lists cached and exposes the one for the active tab.
///
/// Each upstream query is subscribed exactly once, at construction. Switching
/// tabs only reads the cache.
pub struct DocumentListAggregator {
    shared: Arc<Shared>,
    cancel: CancellationToken,
}

impl DocumentListAggregator {
    pub fn spawn(
        published: &dyn LiveQuery<DocumentItem>,
        saved: &dyn LiveQuery<SavedDocument>,
        downloaded: &dyn LiveQuery<DocumentItem>,
        cancel: CancellationToken,
    ) -> Self {
        let (visible_tx, _) = watch::channel(Vec::new());
        let shared = Arc::new(Shared {
            cache: Mutex::new(TabCache::default()),
            visible_tx,
        });

        Self::track(&shared, &cancel, ProfileTab::Published, published.subscribe());
        Self::track(
            &shared,
            &cancel,
            ProfileTab::Saved,
            saved
                .subscribe()
                .map(|docs| docs.into_iter().map(DocumentItem::from).collect())
                .boxed(),
        );
        Self::track(&shared, &cancel, ProfileTab::Downloaded, downloaded.subscribe());

        Self { shared, cancel }
    }

    fn track(
        shared: &Arc<Shared>,
        cancel: &CancellationToken,
        tab: ProfileTab,
        mut source: BoxStream<'static, Vec<DocumentItem>>,
    ) {
        let shared = shared.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => break,

                    next = source.next() => match next {
                        Some(items) => {
                            tracing::debug!(tab = %tab, count = items.len(), "Profile list updated");
                            shared.store(tab, items);
                        }
                        None => {
                            tracing::debug!(tab = %tab, "Profile list source closed");
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Makes `tab` active and returns its cached list.
    pub fn select_tab(&self, tab: ProfileTab) -> Vec<DocumentItem> {
        let mut cache = self.shared.cache();
        cache.active = tab;
        let items = cache.get(tab).to_vec();
        self.shared.visible_tx.send_replace(items.clone());
        items
    }

    pub fn active_tab(&self) -> ProfileTab {
        self.shared.cache().active
    }

    /// Cached list for `tab`, without changing the active tab.
    pub fn list_for(&self, tab: ProfileTab) -> Vec<DocumentItem> {
        self.shared.cache().get(tab).to_vec()
    }

    /// Live view of the active tab's list.
    pub fn visible(&self) -> watch::Receiver<Vec<DocumentItem>> {
        self.shared.visible_tx.subscribe()
    }
}

impl Drop for DocumentListAggregator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
