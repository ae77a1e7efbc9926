//! Interface enumeration trait and error types.

use super::InterfaceSnapshot;
use thiserror::Error;

/// Error type for interface enumeration.
///
/// Describes what went wrong without dictating recovery strategy.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Windows API call failed.
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApi(#[from] windows::core::Error),

    /// An OS call failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Permission denied to access network information.
    #[error("Permission denied: {context}")]
    PermissionDenied {
        /// Additional context about what permission was denied.
        context: String,
    },

    /// Platform-specific error with a generic message.
    #[error("Platform error: {message}")]
    Platform {
        /// Error message describing the platform-specific failure.
        message: String,
    },
}

/// Source of interface snapshots.
///
/// The notifier treats this as a black box and calls it once per poll
/// cycle. Mock implementations make the notifier testable without touching
/// the host's interface table.
///
/// # Example
///
/// ```
/// use net_change_notifier::network::{FetchError, InterfaceEnumerator, InterfaceSnapshot};
///
/// struct NoInterfaces;
///
/// impl InterfaceEnumerator for NoInterfaces {
///     fn fetch(&self) -> Result<InterfaceSnapshot, FetchError> {
///         Ok(InterfaceSnapshot::default())
///     }
/// }
///
/// assert!(NoInterfaces.fetch().unwrap().is_empty());
/// ```
pub trait InterfaceEnumerator: Send + Sync {
    /// Fetches the current interfaces and their address records.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the host facility cannot be queried.
    ///
    /// # Implementation Notes
    ///
    /// - Return every interface; filtering is the caller's job
    /// - Group and record order should be stable across calls while the
    ///   configuration is unchanged, since order is part of the comparison
    fn fetch(&self) -> Result<InterfaceSnapshot, FetchError>;
}

impl<T: InterfaceEnumerator + ?Sized> InterfaceEnumerator for Box<T> {
    fn fetch(&self) -> Result<InterfaceSnapshot, FetchError> {
        self.as_ref().fetch()
    }
}

impl<T: InterfaceEnumerator + ?Sized> InterfaceEnumerator for std::sync::Arc<T> {
    fn fetch(&self) -> Result<InterfaceSnapshot, FetchError> {
        self.as_ref().fetch()
    }
}
