//! Error types for the notifier layer.

use std::time::Duration;

use crate::network::FetchError;
use thiserror::Error;

/// Error type for notifier operations.
///
/// Construction failures are returned from [`super::NetworkChangeNotifier::new`];
/// failures during a poll tick are delivered to error listeners.
#[derive(Debug, Error)]
pub enum NotifierError {
    /// The host enumeration facility failed.
    #[error("Failed to enumerate network interfaces: {0}")]
    Fetch(#[from] FetchError),

    /// A snapshot could not be serialized.
    #[error("Failed to serialize network interfaces: {0}")]
    Serialize(#[from] serde_json::Error),

    /// No Tokio runtime was available to drive the poll timer.
    #[error("No Tokio runtime available to drive the poll timer")]
    NoRuntime,

    /// The poll interval cannot be scheduled.
    #[error("Invalid poll interval {interval:?}: too large to schedule")]
    InvalidInterval {
        /// The rejected interval.
        interval: Duration,
    },
}
