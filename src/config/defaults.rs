//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

use crate::network::IpVersion;

/// Default polling interval in milliseconds.
pub const POLL_INTERVAL_MS: u64 = 1000;

/// Largest accepted polling interval in milliseconds (one day).
pub const MAX_POLL_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;

/// Default IP version filter.
pub const IP_VERSION: IpVersion = IpVersion::Both;

/// Default output path for the `init` command.
pub const CONFIG_FILE: &str = "net-change-notifier.toml";

/// Default polling interval as Duration.
#[must_use]
pub const fn poll_interval() -> Duration {
    Duration::from_millis(POLL_INTERVAL_MS)
}
