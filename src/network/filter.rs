//! Filtering of address records and interfaces.
//!
//! Two levels of filtering exist:
//!
//! - **Record level**: [`AddressFilter`] is the predicate a notifier applies
//!   to every address record before serializing a snapshot. Rejected records
//!   disappear, but their group keeps its position (as an empty list).
//! - **Interface level**: [`InterfaceFilter`] implementations decide whether
//!   a whole interface is visible at all. [`FilteredEnumerator`] applies one
//!   transparently to any [`InterfaceEnumerator`], so removed interfaces
//!   never reach the notifier.
//!
//! Interface filters compose through [`FilterChain`]:
//! - Exclude filters: AND logic (must pass ALL excludes)
//! - Include filters: OR logic (pass ANY include, empty = match all)

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::{
    FetchError, InterfaceAddress, InterfaceEnumerator, InterfaceGroup, InterfaceSnapshot,
    IpVersion,
};

// ============================================================================
// AddressFilter - record-level predicate
// ============================================================================

/// Immutable, shareable predicate over address records.
///
/// The default filter accepts every record.
///
/// # Examples
///
/// ```
/// use net_change_notifier::network::AddressFilter;
/// use net_change_notifier::network::{InterfaceAddress, MacAddress};
/// use std::net::Ipv4Addr;
///
/// let filter = AddressFilter::new(|record| !record.internal);
///
/// let loopback = InterfaceAddress::v4(
///     Ipv4Addr::LOCALHOST,
///     Ipv4Addr::new(255, 0, 0, 0),
///     MacAddress::UNSPECIFIED,
///     true,
/// );
/// assert!(!filter.matches(&loopback));
/// ```
#[derive(Clone)]
pub struct AddressFilter {
    predicate: Arc<dyn Fn(&InterfaceAddress) -> bool + Send + Sync>,
}

impl AddressFilter {
    /// Wraps a predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&InterfaceAddress) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Accepts every record.
    #[must_use]
    pub fn accept_all() -> Self {
        Self::new(|_| true)
    }

    /// Rejects records marked internal (loopback and similar).
    #[must_use]
    pub fn exclude_internal() -> Self {
        Self::new(|record| !record.internal)
    }

    /// Accepts only records of the selected IP version(s).
    #[must_use]
    pub fn ip_version(version: IpVersion) -> Self {
        Self::new(move |record| version.includes(record.family))
    }

    /// Returns a filter accepting records that pass both `self` and `other`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::new(move |record| self.matches(record) && other.matches(record))
    }

    /// Returns true if the record should be considered.
    #[must_use]
    pub fn matches(&self, record: &InterfaceAddress) -> bool {
        (self.predicate)(record)
    }
}

impl Default for AddressFilter {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl fmt::Debug for AddressFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressFilter").finish_non_exhaustive()
    }
}

impl<F> From<F> for AddressFilter
where
    F: Fn(&InterfaceAddress) -> bool + Send + Sync + 'static,
{
    fn from(predicate: F) -> Self {
        Self::new(predicate)
    }
}

// ============================================================================
// InterfaceFilter - interface-level matchers
// ============================================================================

/// Trait for matching whole interfaces.
///
/// Filters must be `Send + Sync` so a filtered enumerator can be polled
/// from the runtime's worker threads.
pub trait InterfaceFilter: Send + Sync {
    /// Returns `true` if the interface matches this filter.
    fn matches(&self, group: &InterfaceGroup) -> bool;
}

/// Matches interfaces by name pattern (pure matcher, no include/exclude semantics).
///
/// # Examples
///
/// ```
/// use net_change_notifier::network::filter::{InterfaceFilter, NameRegexFilter};
/// use net_change_notifier::network::InterfaceGroup;
///
/// let filter = NameRegexFilter::new(r"^eth").unwrap();
///
/// assert!(filter.matches(&InterfaceGroup::new("eth0", vec![])));
/// assert!(!filter.matches(&InterfaceGroup::new("wlan0", vec![])));
/// ```
#[derive(Debug, Clone)]
pub struct NameRegexFilter {
    pattern: Regex,
}

impl NameRegexFilter {
    /// Creates a name filter with the given regex pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex pattern is invalid.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Returns a reference to the regex pattern.
    #[must_use]
    pub const fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

impl InterfaceFilter for NameRegexFilter {
    fn matches(&self, group: &InterfaceGroup) -> bool {
        self.pattern.is_match(&group.name)
    }
}

/// Matches interfaces that carry at least one internal record.
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalInterfaceFilter;

impl InterfaceFilter for InternalInterfaceFilter {
    fn matches(&self, group: &InterfaceGroup) -> bool {
        group.has_internal()
    }
}

/// Filter chain with include/exclude semantics.
///
/// Evaluation order:
/// 1. **Exclude filters (AND)**: Any match → reject.
/// 2. **Include filters (OR)**: Any match → accept. Empty includes = match all.
///
/// # Examples
///
/// ```
/// use net_change_notifier::network::filter::{FilterChain, InterfaceFilter, NameRegexFilter};
/// use net_change_notifier::network::InterfaceGroup;
///
/// let chain = FilterChain::new()
///     .exclude(NameRegexFilter::new("^docker").unwrap())
///     .include(NameRegexFilter::new("^(eth|docker)").unwrap());
///
/// assert!(chain.matches(&InterfaceGroup::new("eth0", vec![])));
/// assert!(!chain.matches(&InterfaceGroup::new("docker0", vec![])));
/// assert!(!chain.matches(&InterfaceGroup::new("wlan0", vec![])));
/// ```
#[derive(Default)]
pub struct FilterChain {
    includes: Vec<Box<dyn InterfaceFilter>>,
    excludes: Vec<Box<dyn InterfaceFilter>>,
}

impl FilterChain {
    /// Creates an empty filter chain (matches all interfaces).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an include filter (OR semantics).
    #[must_use]
    pub fn include<F: InterfaceFilter + 'static>(mut self, filter: F) -> Self {
        self.includes.push(Box::new(filter));
        self
    }

    /// Adds an exclude filter (rejects on ANY match).
    #[must_use]
    pub fn exclude<F: InterfaceFilter + 'static>(mut self, filter: F) -> Self {
        self.excludes.push(Box::new(filter));
        self
    }

    /// Returns the number of include filters.
    #[must_use]
    pub fn include_count(&self) -> usize {
        self.includes.len()
    }

    /// Returns the number of exclude filters.
    #[must_use]
    pub fn exclude_count(&self) -> usize {
        self.excludes.len()
    }

    /// Returns true if no filters are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }
}

impl InterfaceFilter for FilterChain {
    fn matches(&self, group: &InterfaceGroup) -> bool {
        if self.excludes.iter().any(|f| f.matches(group)) {
            return false;
        }

        self.includes.is_empty() || self.includes.iter().any(|f| f.matches(group))
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("include_count", &self.includes.len())
            .field("exclude_count", &self.excludes.len())
            .finish()
    }
}

impl<T: InterfaceFilter + ?Sized> InterfaceFilter for &T {
    fn matches(&self, group: &InterfaceGroup) -> bool {
        (*self).matches(group)
    }
}

impl InterfaceFilter for Box<dyn InterfaceFilter> {
    fn matches(&self, group: &InterfaceGroup) -> bool {
        self.as_ref().matches(group)
    }
}

// ============================================================================
// FilteredEnumerator - decorator
// ============================================================================

/// An enumerator decorator that drops interfaces rejected by a filter.
///
/// # Examples
///
/// ```ignore
/// use net_change_notifier::network::filter::{FilteredEnumerator, NameRegexFilter};
/// use net_change_notifier::network::platform::PlatformEnumerator;
///
/// let enumerator = FilteredEnumerator::new(
///     PlatformEnumerator::default(),
///     NameRegexFilter::new("^(eth|wlan)")?,
/// );
/// ```
#[derive(Debug)]
pub struct FilteredEnumerator<E, F> {
    inner: E,
    filter: F,
}

impl<E, F> FilteredEnumerator<E, F> {
    /// Creates a new filtered enumerator.
    #[must_use]
    pub const fn new(inner: E, filter: F) -> Self {
        Self { inner, filter }
    }

    /// Returns a reference to the inner enumerator.
    pub const fn inner(&self) -> &E {
        &self.inner
    }

    /// Returns a reference to the filter.
    pub const fn filter(&self) -> &F {
        &self.filter
    }
}

impl<E: InterfaceEnumerator, F: InterfaceFilter> InterfaceEnumerator for FilteredEnumerator<E, F> {
    fn fetch(&self) -> Result<InterfaceSnapshot, FetchError> {
        let snapshot = self.inner.fetch()?;
        Ok(snapshot.retain_groups(|group| self.filter.matches(group)))
    }
}
