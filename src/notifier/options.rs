//! Notifier construction options.

use std::time::Duration;

use tokio::time::Instant;

use super::NotifierError;
use crate::network::{AddressFilter, InterfaceAddress};

/// Default interval between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Shortest period the poll timer is armed with.
///
/// A zero interval means "as fast as the scheduler allows"; timers are
/// clamped to this floor.
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Options for [`super::NetworkChangeNotifier`].
///
/// # Example
///
/// ```
/// use net_change_notifier::notifier::NotifierOptions;
/// use std::time::Duration;
///
/// let options = NotifierOptions::new()
///     .with_poll_interval(Duration::from_secs(5))
///     .with_filter(|record: &net_change_notifier::network::InterfaceAddress| !record.internal);
///
/// assert_eq!(options.poll_interval(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct NotifierOptions {
    poll_interval: Duration,
    filter: AddressFilter,
}

impl Default for NotifierOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            filter: AddressFilter::accept_all(),
        }
    }
}

impl NotifierOptions {
    /// Creates options with the defaults: 1000 ms interval, accept-all filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the interval between polls. Zero is allowed.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the interval between polls in milliseconds.
    #[must_use]
    pub const fn with_poll_interval_ms(self, millis: u64) -> Self {
        self.with_poll_interval(Duration::from_millis(millis))
    }

    /// Sets the record filter.
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&InterfaceAddress) -> bool + Send + Sync + 'static,
    {
        self.filter = AddressFilter::new(filter);
        self
    }

    /// Sets an already-built record filter.
    #[must_use]
    pub fn with_address_filter(mut self, filter: AddressFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Returns the configured poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the record filter.
    #[must_use]
    pub const fn filter(&self) -> &AddressFilter {
        &self.filter
    }

    /// Returns the period the poll timer is actually armed with.
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        self.poll_interval.max(MIN_TICK_PERIOD)
    }

    /// Checks that the interval can be scheduled on the timer.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::InvalidInterval`] if the first tick's
    /// deadline would overflow the clock.
    pub fn validate(&self) -> Result<(), NotifierError> {
        Instant::now()
            .checked_add(self.tick_period())
            .map(|_| ())
            .ok_or(NotifierError::InvalidInterval {
                interval: self.poll_interval,
            })
    }
}
