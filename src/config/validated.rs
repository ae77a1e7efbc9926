//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::network::IpVersion;
use crate::network::filter::{AddressFilter, FilterChain, NameRegexFilter};
use crate::notifier::NotifierOptions;

use super::cli::Cli;
use super::defaults;
use super::error::ConfigError;
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Polling interval
    pub poll_interval: Duration,

    /// Whether internal (loopback) records are dropped
    pub exclude_internal: bool,

    /// IP version to watch
    pub ip_version: IpVersion,

    /// Interface name filter applied before records are serialized
    pub interfaces: FilterChain,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config {{ poll_interval: {}ms, ip_version: {}, exclude_internal: {}, \
             include: {}, exclude: {} }}",
            self.poll_interval.as_millis(),
            self.ip_version,
            self.exclude_internal,
            self.interfaces.include_count(),
            self.interfaces.exclude_count(),
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Regex patterns are invalid
    /// - The IP version string is not recognized
    /// - The poll interval exceeds [`defaults::MAX_POLL_INTERVAL_MS`]
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let poll_interval = Self::resolve_poll_interval(cli, toml)?;

        // Flags only enable
        let exclude_internal =
            cli.exclude_internal || toml.is_some_and(|t| t.filter.exclude_internal);

        let ip_version = Self::resolve_ip_version(cli, toml)?;
        let interfaces = Self::build_interface_filter(cli, toml)?;

        Ok(Self {
            poll_interval,
            exclude_internal,
            ip_version,
            interfaces,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    /// Builds the record filter from `exclude_internal` and `ip_version`.
    #[must_use]
    pub fn address_filter(&self) -> AddressFilter {
        let by_version = AddressFilter::ip_version(self.ip_version);
        if self.exclude_internal {
            AddressFilter::exclude_internal().and(by_version)
        } else {
            by_version
        }
    }

    /// Builds notifier options from this configuration.
    #[must_use]
    pub fn notifier_options(&self) -> NotifierOptions {
        NotifierOptions::new()
            .with_poll_interval(self.poll_interval)
            .with_address_filter(self.address_filter())
    }

    fn resolve_poll_interval(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Duration, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let millis = cli
            .poll_interval_ms
            .or_else(|| toml.and_then(|t| t.monitor.poll_interval_ms))
            .unwrap_or(defaults::POLL_INTERVAL_MS);

        if millis > defaults::MAX_POLL_INTERVAL_MS {
            return Err(ConfigError::InvalidDuration {
                field: "poll_interval_ms",
                reason: format!("must be at most {}", defaults::MAX_POLL_INTERVAL_MS),
            });
        }

        Ok(Duration::from_millis(millis))
    }

    fn resolve_ip_version(cli: &Cli, toml: Option<&TomlConfig>) -> Result<IpVersion, ConfigError> {
        if let Some(version) = cli.ip_version {
            return Ok(version.into());
        }

        toml.and_then(|t| t.filter.ip_version.as_deref())
            .map_or(Ok(defaults::IP_VERSION), parse_ip_version)
    }

    fn build_interface_filter(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<FilterChain, ConfigError> {
        let toml_filter = toml.map(|t| &t.filter);

        // CLI patterns replace TOML patterns, per list
        let includes = if cli.include_interfaces.is_empty() {
            toml_filter.map_or(&[][..], |f| f.include.as_slice())
        } else {
            cli.include_interfaces.as_slice()
        };
        let excludes = if cli.exclude_interfaces.is_empty() {
            toml_filter.map_or(&[][..], |f| f.exclude.as_slice())
        } else {
            cli.exclude_interfaces.as_slice()
        };

        let mut chain = FilterChain::new();
        for pattern in includes {
            chain = chain.include(compile(pattern)?);
        }
        for pattern in excludes {
            chain = chain.exclude(compile(pattern)?);
        }

        Ok(chain)
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn parse_ip_version(s: &str) -> Result<IpVersion, ConfigError> {
    match s.to_lowercase().as_str() {
        "ipv4" | "v4" | "4" => Ok(IpVersion::V4),
        "ipv6" | "v6" | "6" => Ok(IpVersion::V6),
        "both" | "all" | "dual" => Ok(IpVersion::Both),
        _ => Err(ConfigError::InvalidIpVersion {
            value: s.to_string(),
        }),
    }
}

fn compile(pattern: &str) -> Result<NameRegexFilter, ConfigError> {
    NameRegexFilter::new(pattern).map_err(|e| ConfigError::InvalidRegex {
        pattern: pattern.to_string(),
        source: e,
    })
}
