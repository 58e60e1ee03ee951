//! Synchronous fan-out of change notifications to registered observers

use futures::Stream;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::warn;

use crate::store::ChangeNotification;

type Observer = Arc<dyn Fn(&Arc<ChangeNotification>) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    observers: Mutex<Vec<(u64, Observer)>>,
}

impl Registry {
    fn remove(&self, id: u64) {
        if let Ok(mut observers) = self.observers.lock() {
            observers.retain(|(existing, _)| *existing != id);
        }
    }
}

/// Ordered list of observers called after every applied packet.
///
/// Observers run in registration order on the task that applied the packet.
/// A panicking observer is logged and skipped; later observers still run.
#[derive(Clone, Default)]
pub struct Subscribers {
    inner: Arc<Registry>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Dropping the returned handle does not unsubscribe.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&Arc<ChangeNotification>) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut observers) = self.inner.observers.lock() {
            observers.push((id, Arc::new(observer)));
        }
        Subscription { id, registry: Arc::downgrade(&self.inner) }
    }

    /// Stream of notifications from now on. Dropping the stream unsubscribes.
    pub fn stream(&self) -> UpdateStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |change| {
            let _ = tx.send(change.clone());
        });
        UpdateStream { subscription, inner: UnboundedReceiverStream::new(rx) }
    }

    pub fn len(&self) -> usize {
        self.inner.observers.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver one notification to every observer.
    pub fn notify(&self, change: &Arc<ChangeNotification>) {
        // Snapshot so observers may (un)subscribe while being called.
        let observers: Vec<Observer> = match self.inner.observers.lock() {
            Ok(observers) => observers.iter().map(|(_, o)| o.clone()).collect(),
            Err(_) => return,
        };

        for observer in observers {
            if catch_unwind(AssertUnwindSafe(|| observer(change))).is_err() {
                warn!(kind = %change.kind, id = ?change.id, "Observer panicked while handling change");
            }
        }
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers").field("len", &self.len()).finish()
    }
}

/// Handle for removing one observer.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Remove the observer. Calling this more than once is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

/// Notifications forwarded into an unbounded channel.
///
/// Ends once its subscription is removed and every buffered item is read.
#[derive(Debug)]
pub struct UpdateStream {
    subscription: Subscription,
    inner: UnboundedReceiverStream<Arc<ChangeNotification>>,
}

impl UpdateStream {
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl Stream for UpdateStream {
    type Item = Arc<ChangeNotification>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for UpdateStream {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}
