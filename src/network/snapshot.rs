//! Interface snapshots and their canonical serialized form.

use serde::Serialize;

use super::InterfaceAddress;

/// All addresses of one named interface, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceGroup {
    /// Interface name as reported by the host (e.g. "eth0", "Wi-Fi").
    pub name: String,
    /// Address records in the order the host reported them.
    pub addresses: Vec<InterfaceAddress>,
}

impl InterfaceGroup {
    /// Creates a group.
    #[must_use]
    pub fn new(name: impl Into<String>, addresses: Vec<InterfaceAddress>) -> Self {
        Self {
            name: name.into(),
            addresses,
        }
    }

    /// Returns true if any record is marked internal.
    #[must_use]
    pub fn has_internal(&self) -> bool {
        self.addresses.iter().any(|a| a.internal)
    }
}

/// The set of interfaces visible to the host at one instant.
///
/// # Ordering
///
/// Both group order and record order are significant: two snapshots holding
/// the same records in a different order serialize differently and are
/// treated as changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceSnapshot {
    groups: Vec<InterfaceGroup>,
}

impl InterfaceSnapshot {
    /// Creates a snapshot from groups in enumeration order.
    #[must_use]
    pub const fn new(groups: Vec<InterfaceGroup>) -> Self {
        Self { groups }
    }

    /// Returns the groups in enumeration order.
    #[must_use]
    pub fn groups(&self) -> &[InterfaceGroup] {
        &self.groups
    }

    /// Returns the group with the given name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&InterfaceGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Returns the number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if no interfaces were reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the total number of address records across all groups.
    #[must_use]
    pub fn address_count(&self) -> usize {
        self.groups.iter().map(|g| g.addresses.len()).sum()
    }

    /// Keeps only groups for which `keep` returns true.
    #[must_use]
    pub fn retain_groups(mut self, keep: impl FnMut(&InterfaceGroup) -> bool) -> Self {
        self.groups.retain(keep);
        self
    }

    /// Serializes the records accepted by `filter` into the canonical form.
    ///
    /// The result is a JSON array with one entry per group, in group order.
    /// Each entry is the array of accepted records in their original order.
    /// Groups whose records are all rejected stay in place as `[]`, so group
    /// positions never shift. Group names are not encoded.
    ///
    /// # Errors
    ///
    /// Returns an error only if a record fails to serialize.
    pub fn serialize_filtered<F>(&self, filter: F) -> Result<String, serde_json::Error>
    where
        F: Fn(&InterfaceAddress) -> bool,
    {
        let filtered: Vec<Vec<&InterfaceAddress>> = self
            .groups
            .iter()
            .map(|group| group.addresses.iter().filter(|a| filter(*a)).collect())
            .collect();

        serde_json::to_string(&filtered)
    }
}

impl From<Vec<InterfaceGroup>> for InterfaceSnapshot {
    fn from(groups: Vec<InterfaceGroup>) -> Self {
        Self::new(groups)
    }
}

impl FromIterator<InterfaceGroup> for InterfaceSnapshot {
    fn from_iter<I: IntoIterator<Item = InterfaceGroup>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
