use futures::stream::{BoxStream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A query whose result set is pushed to subscribers whenever it changes.
///
/// Each call to `subscribe` opens a new upstream subscription; the stream
/// yields the current result first, then every later result.
pub trait LiveQuery<T>: Send + Sync {
    fn subscribe(&self) -> BoxStream<'static, Vec<T>>;
}

/// Adapts a `watch` receiver into a [`LiveQuery`].
pub struct WatchQuery<T> {
    rx: watch::Receiver<Vec<T>>,
}

impl<T> WatchQuery<T> {
    pub fn new(rx: watch::Receiver<Vec<T>>) -> Self {
        Self { rx }
    }
}

impl<T> LiveQuery<T> for WatchQuery<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn subscribe(&self) -> BoxStream<'static, Vec<T>> {
        WatchStream::new(self.rx.clone()).boxed()
    }
}
