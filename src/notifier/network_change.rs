//! The polling change notifier.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::listeners::{ChangeStream, ListenerId, Listeners};
use super::{NotifierError, NotifierOptions, lock};
use crate::network::{AddressFilter, InterfaceEnumerator};

#[cfg(any(unix, windows))]
use crate::network::platform::PlatformEnumerator;

/// Polls the host's network interfaces and notifies listeners when the
/// serialized, filtered view changes.
///
/// Construction captures a baseline and starts polling immediately. Each
/// tick re-serializes the interfaces; if the result differs from the
/// previous tick, every change listener is called once and the new value
/// becomes the comparison point.
///
/// Dropping the notifier stops polling.
///
/// # Example
///
/// ```no_run
/// use net_change_notifier::notifier::{NetworkChangeNotifier, NotifierOptions};
///
/// # async fn example() -> Result<(), net_change_notifier::notifier::NotifierError> {
/// let notifier = NetworkChangeNotifier::platform(
///     NotifierOptions::new().with_filter(|record| !record.internal),
/// )?;
///
/// notifier.on_change(|| println!("network interfaces changed"));
/// # Ok(())
/// # }
/// ```
pub struct NetworkChangeNotifier<E> {
    inner: Arc<Inner<E>>,
}

struct Inner<E> {
    enumerator: E,
    options: NotifierOptions,
    runtime: Handle,
    state: Mutex<State>,
    listeners: Arc<Listeners>,
}

struct State {
    previous: String,
    generation: u64,
    timer: Option<PollTimer>,
}

/// The running poll task. Dropping it cancels the task.
struct PollTimer {
    generation: u64,
    task: JoinHandle<()>,
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(any(unix, windows))]
impl NetworkChangeNotifier<PlatformEnumerator> {
    /// Creates a notifier over the host's own interfaces.
    ///
    /// # Errors
    ///
    /// See [`NetworkChangeNotifier::new`].
    pub fn platform(options: NotifierOptions) -> Result<Self, NotifierError> {
        Self::new(PlatformEnumerator::new(), options)
    }
}

impl<E> NetworkChangeNotifier<E>
where
    E: InterfaceEnumerator + 'static,
{
    /// Creates a notifier on the current Tokio runtime and starts polling.
    ///
    /// # Errors
    ///
    /// - [`NotifierError::NoRuntime`] if called outside a Tokio runtime
    /// - [`NotifierError::InvalidInterval`] if the interval cannot be scheduled
    /// - [`NotifierError::Fetch`] if the baseline enumeration fails
    pub fn new(enumerator: E, options: NotifierOptions) -> Result<Self, NotifierError> {
        let runtime = Handle::try_current().map_err(|_| NotifierError::NoRuntime)?;
        Self::with_runtime(enumerator, options, runtime)
    }

    /// Creates a notifier whose poll task runs on `runtime`.
    ///
    /// # Errors
    ///
    /// Same as [`NetworkChangeNotifier::new`], minus [`NotifierError::NoRuntime`].
    pub fn with_runtime(
        enumerator: E,
        options: NotifierOptions,
        runtime: Handle,
    ) -> Result<Self, NotifierError> {
        options.validate()?;
        let previous = serialize_interfaces(&enumerator, options.filter())?;

        tracing::debug!(
            poll_interval_ms = options.poll_interval().as_millis(),
            "Captured baseline network interfaces"
        );

        let notifier = Self {
            inner: Arc::new(Inner {
                enumerator,
                options,
                runtime,
                state: Mutex::new(State {
                    previous,
                    generation: 0,
                    timer: None,
                }),
                listeners: Arc::new(Listeners::default()),
            }),
        };
        notifier.start();
        Ok(notifier)
    }

    /// Starts polling. Any timer already running is replaced, so at most
    /// one is ever active.
    ///
    /// The first tick fires one interval after this call.
    pub fn start(&self) {
        Inner::start(&self.inner);
    }

    /// Serializes the current filtered interfaces without touching the
    /// comparison baseline.
    ///
    /// # Errors
    ///
    /// Returns an error if enumeration or serialization fails.
    pub fn interfaces_serialized(&self) -> Result<String, NotifierError> {
        serialize_interfaces(&self.inner.enumerator, self.inner.options.filter())
    }

    /// Returns a handle that can start and stop this notifier without
    /// keeping it alive.
    #[must_use]
    pub fn controller(&self) -> NotifierController<E> {
        NotifierController {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl<E> NetworkChangeNotifier<E> {
    /// Stops polling. No tick begins after this returns. Idempotent.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Returns whether a poll timer is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.inner.state).timer.is_some()
    }

    /// Returns the serialized value the next tick will compare against.
    #[must_use]
    pub fn baseline(&self) -> String {
        lock(&self.inner.state).previous.clone()
    }

    /// Returns the configured poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.inner.options.poll_interval()
    }

    /// Returns the record filter.
    #[must_use]
    pub fn filter(&self) -> &AddressFilter {
        self.inner.options.filter()
    }

    /// Registers a change listener.
    pub fn on_change<F>(&self, handler: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.listeners.add_change(Arc::new(handler))
    }

    /// Registers a listener for poll failures.
    ///
    /// A failed poll leaves the baseline unchanged and emits no change event.
    pub fn on_error<F>(&self, handler: F) -> ListenerId
    where
        F: Fn(&NotifierError) + Send + Sync + 'static,
    {
        self.inner.listeners.add_error(Arc::new(handler))
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    /// Returns the number of registered change listeners, streams included.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.change_count()
    }

    /// Returns a stream yielding once per change event.
    #[must_use]
    pub fn subscribe(&self) -> ChangeStream {
        ChangeStream::register(&self.inner.listeners)
    }
}

impl<E> Drop for NetworkChangeNotifier<E> {
    fn drop(&mut self) {
        self.inner.stop();
    }
}

impl<E> std::fmt::Debug for NetworkChangeNotifier<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkChangeNotifier")
            .field("poll_interval", &self.poll_interval())
            .field("running", &self.is_running())
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

/// A weak handle to a [`NetworkChangeNotifier`].
///
/// Safe to capture in listeners: it does not keep the notifier alive, and
/// calling [`stop`](Self::stop) from inside a handler takes effect before
/// the next tick.
pub struct NotifierController<E> {
    inner: Weak<Inner<E>>,
}

impl<E> Clone for NotifierController<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<E> NotifierController<E>
where
    E: InterfaceEnumerator + 'static,
{
    /// Starts polling. Returns `false` if the notifier has been dropped.
    pub fn start(&self) -> bool {
        self.inner.upgrade().is_some_and(|inner| {
            Inner::start(&inner);
            true
        })
    }
}

impl<E> NotifierController<E> {
    /// Stops polling. Returns `false` if the notifier has been dropped.
    pub fn stop(&self) -> bool {
        self.inner.upgrade().is_some_and(|inner| {
            inner.stop();
            true
        })
    }

    /// Returns whether the notifier is alive and polling.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| lock(&inner.state).timer.is_some())
    }
}

impl<E> std::fmt::Debug for NotifierController<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierController")
            .field("running", &self.is_running())
            .finish()
    }
}

impl<E> Inner<E>
where
    E: InterfaceEnumerator + 'static,
{
    fn start(this: &Arc<Self>) {
        let mut state = lock(&this.state);
        // Replacing the timer aborts the previous task.
        state.timer = None;
        state.generation = state.generation.wrapping_add(1);

        let generation = state.generation;
        let period = this.options.tick_period();
        let task = this
            .runtime
            .spawn(poll_loop(Arc::downgrade(this), generation, period));
        state.timer = Some(PollTimer { generation, task });

        tracing::debug!(generation, period_ms = period.as_millis(), "Polling started");
    }

    /// Runs one poll. Returns `false` if this timer has been superseded.
    fn poll_once(&self, generation: u64) -> bool {
        let outcome = {
            let mut state = lock(&self.state);
            if !state
                .timer
                .as_ref()
                .is_some_and(|timer| timer.generation == generation)
            {
                return false;
            }

            serialize_interfaces(&self.enumerator, self.options.filter()).map(|current| {
                let changed = current != state.previous;
                if changed {
                    tracing::debug!(snapshot = %current, "Network interfaces changed");
                    state.previous = current;
                }
                changed
            })
        };

        match outcome {
            Ok(true) => {
                self.listeners.emit_change();
            }
            Ok(false) => tracing::trace!("Network interfaces unchanged"),
            Err(error) => self.report(&error),
        }
        true
    }

    fn report(&self, error: &NotifierError) {
        if self.listeners.error_count() == 0 {
            tracing::warn!("Poll failed: {error}");
        } else {
            tracing::debug!("Poll failed: {error}");
            self.listeners.emit_error(error);
        }
    }
}

impl<E> Inner<E> {
    fn stop(&self) {
        if lock(&self.state).timer.take().is_some() {
            tracing::debug!("Polling stopped");
        }
    }
}

async fn poll_loop<E>(weak: Weak<Inner<E>>, generation: u64, period: Duration)
where
    E: InterfaceEnumerator + 'static,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let Some(inner) = weak.upgrade() else {
            break;
        };
        if !inner.poll_once(generation) {
            break;
        }
    }
}

/// Enumerates once and serializes the records accepted by `filter`.
///
/// This is the value a notifier compares between ticks.
///
/// # Errors
///
/// Returns an error if enumeration or serialization fails.
pub fn serialize_interfaces<E>(
    enumerator: &E,
    filter: &AddressFilter,
) -> Result<String, NotifierError>
where
    E: InterfaceEnumerator + ?Sized,
{
    let snapshot = enumerator.fetch()?;
    Ok(snapshot.serialize_filtered(|record| filter.matches(record))?)
}
