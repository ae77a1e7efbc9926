//! Polling network change notifier.
//!
//! [`NetworkChangeNotifier`] captures a serialized, filtered view of the
//! host's interfaces and re-checks it on a fixed interval. Listeners are
//! notified (with no payload) whenever the view differs from the previous
//! tick's.
//!
//! # Components
//!
//! - [`NotifierOptions`]: poll interval and record filter
//! - [`NetworkChangeNotifier`]: the timer, comparison state and listeners
//! - [`NotifierController`]: a weak start/stop handle for use inside handlers
//! - [`ChangeStream`]: change events as a [`tokio_stream::Stream`]

mod error;
mod listeners;
mod network_change;
mod options;

#[cfg(test)]
mod network_change_tests;
#[cfg(test)]
pub(crate) mod test_fixtures;

pub use error::NotifierError;
pub use listeners::{ChangeStream, ListenerId};
pub use network_change::{NetworkChangeNotifier, NotifierController, serialize_interfaces};
pub use options::{DEFAULT_POLL_INTERVAL, MIN_TICK_PERIOD, NotifierOptions};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, recovering the guard if a handler panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
