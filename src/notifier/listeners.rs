//! Listener registry and the change stream.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{NotifierError, lock};

type ChangeHandler = Arc<dyn Fn() + Send + Sync>;
type ErrorHandler = Arc<dyn Fn(&NotifierError) + Send + Sync>;

/// Identifies a registered listener for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Change and error handlers, invoked in registration order.
///
/// Handlers are cloned out of the lock before being called, so a handler
/// may register or remove listeners (or stop the notifier) without
/// deadlocking.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: AtomicU64,
    change: Mutex<Vec<(ListenerId, ChangeHandler)>>,
    error: Mutex<Vec<(ListenerId, ErrorHandler)>>,
}

impl Listeners {
    fn next_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn add_change(&self, handler: ChangeHandler) -> ListenerId {
        let id = self.next_id();
        lock(&self.change).push((id, handler));
        id
    }

    pub(crate) fn add_error(&self, handler: ErrorHandler) -> ListenerId {
        let id = self.next_id();
        lock(&self.error).push((id, handler));
        id
    }

    /// Removes a listener of either kind. Returns `false` if `id` was not registered.
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut change = lock(&self.change);
        if let Some(pos) = change.iter().position(|(entry, _)| *entry == id) {
            change.remove(pos);
            return true;
        }
        drop(change);

        let mut error = lock(&self.error);
        if let Some(pos) = error.iter().position(|(entry, _)| *entry == id) {
            error.remove(pos);
            return true;
        }
        false
    }

    pub(crate) fn change_count(&self) -> usize {
        lock(&self.change).len()
    }

    pub(crate) fn error_count(&self) -> usize {
        lock(&self.error).len()
    }

    /// Calls every change handler. Returns how many were called.
    pub(crate) fn emit_change(&self) -> usize {
        let handlers: Vec<ChangeHandler> = lock(&self.change)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in &handlers {
            handler();
        }
        handlers.len()
    }

    /// Calls every error handler. Returns how many were called.
    pub(crate) fn emit_error(&self, error: &NotifierError) -> usize {
        let handlers: Vec<ErrorHandler> = lock(&self.error)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in &handlers {
            handler(error);
        }
        handlers.len()
    }
}

/// A stream that yields `()` once per change event.
///
/// Created by [`super::NetworkChangeNotifier::subscribe`]. Dropping the
/// stream unregisters it. The stream ends when the notifier is dropped.
pub struct ChangeStream {
    inner: UnboundedReceiverStream<()>,
    id: ListenerId,
    listeners: Weak<Listeners>,
}

impl ChangeStream {
    pub(crate) fn register(listeners: &Arc<Listeners>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = listeners.add_change(Arc::new(move || {
            // Receiver gone means the stream is being dropped.
            let _ = tx.send(());
        }));

        Self {
            inner: UnboundedReceiverStream::new(rx),
            id,
            listeners: Arc::downgrade(listeners),
        }
    }

    /// Returns the listener id backing this stream.
    #[must_use]
    pub const fn id(&self) -> ListenerId {
        self.id
    }
}

impl Stream for ChangeStream {
    type Item = ();

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for ChangeStream {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.remove(self.id);
        }
    }
}

impl std::fmt::Debug for ChangeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeStream")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
