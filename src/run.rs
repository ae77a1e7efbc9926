//! Application execution logic.
//!
//! This module contains the main async loop that runs the notifier and
//! logs interface changes until shutdown.

use thiserror::Error;
use tokio::signal;
use tokio_stream::StreamExt;

use net_change_notifier::config::ValidatedConfig;
use net_change_notifier::network::filter::{FilterChain, FilteredEnumerator};
use net_change_notifier::network::platform::PlatformEnumerator;
use net_change_notifier::notifier::{NetworkChangeNotifier, NotifierError, serialize_interfaces};

/// Type alias for the application's filtered enumerator.
type AppEnumerator = FilteredEnumerator<PlatformEnumerator, FilterChain>;

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// The notifier could not be created or enumeration failed.
    #[error("Notifier failed: {0}")]
    Notifier(#[from] NotifierError),

    /// Unexpected stream termination.
    #[error("Change stream terminated unexpectedly")]
    StreamTerminated,
}

/// Builds the application's enumerator, consuming the config's interface filter.
fn create_enumerator(config: ValidatedConfig) -> AppEnumerator {
    FilteredEnumerator::new(PlatformEnumerator::new(), config.interfaces)
}

/// Returns the current serialized snapshot with all configured filters applied.
///
/// # Errors
///
/// Returns an error if the interfaces cannot be enumerated or serialized.
pub fn snapshot(config: ValidatedConfig) -> Result<String, RunError> {
    let filter = config.address_filter();
    let enumerator = create_enumerator(config);
    Ok(serialize_interfaces(&enumerator, &filter)?)
}

/// Executes the main application loop.
///
/// This function:
/// 1. Creates the filtered platform enumerator
/// 2. Creates the notifier, capturing the baseline
/// 3. Logs every change event until shutdown signal (Ctrl+C / SIGTERM)
///
/// # Errors
///
/// Returns an error if:
/// - The baseline enumeration fails
/// - The change stream terminates unexpectedly
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires:
/// - Platform-specific network APIs
/// - Real async runtime with signal handling
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let options = config.notifier_options();
    let notifier = NetworkChangeNotifier::new(create_enumerator(config), options)?;

    let interval_ms = notifier.poll_interval().as_millis();
    notifier.on_error(move |error| {
        tracing::warn!("Poll failed, retrying in {interval_ms}ms: {error}");
    });

    tracing::info!("Watching network interfaces (interval: {interval_ms}ms)");
    tracing::debug!("Baseline: {}", notifier.baseline());

    let mut changes = notifier.subscribe();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                tracing::info!("Shutdown signal received, stopping...");
                notifier.stop();
                return Ok(());
            }

            event = changes.next() => {
                match event {
                    Some(()) => report_change(&notifier),
                    None => return Err(RunError::StreamTerminated),
                }
            }
        }
    }
}

/// Logs a change event and the value it was detected against.
fn report_change<E>(notifier: &NetworkChangeNotifier<E>) {
    tracing::info!("Network interfaces changed");
    tracing::debug!("Current interfaces: {}", notifier.baseline());
}

/// Returns a future that completes when a shutdown signal is received.
///
/// If a signal handler cannot be installed, that source never completes.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
