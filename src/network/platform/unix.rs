//! Unix interface enumeration using `getifaddrs`.

use std::net::{Ipv4Addr, Ipv6Addr};

use nix::ifaddrs::getifaddrs;
use nix::net::if_::InterfaceFlags;
use nix::sys::socket::SockaddrStorage;

use crate::network::{
    FetchError, InterfaceAddress, InterfaceEnumerator, InterfaceGroup, InterfaceSnapshot,
    MacAddress,
};

/// Unix implementation of [`InterfaceEnumerator`] backed by `getifaddrs(3)`.
///
/// Interfaces are grouped by name in the order `getifaddrs` first reports
/// them. Only interfaces that are both up and running contribute records.
/// Link-layer entries are not records themselves; they supply the MAC
/// address for the interface's IPv4/IPv6 records.
///
/// # Example
///
/// ```no_run
/// use net_change_notifier::network::InterfaceEnumerator;
/// use net_change_notifier::network::platform::UnixEnumerator;
///
/// let snapshot = UnixEnumerator::new().fetch().expect("getifaddrs failed");
/// for group in snapshot.groups() {
///     println!("{}: {} address(es)", group.name, group.addresses.len());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct UnixEnumerator {
    _private: (),
}

impl UnixEnumerator {
    /// Creates a new Unix interface enumerator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl InterfaceEnumerator for UnixEnumerator {
    fn fetch(&self) -> Result<InterfaceSnapshot, FetchError> {
        let addrs = getifaddrs().map_err(std::io::Error::from)?;
        Ok(group_entries(addrs.map(|ifaddr| Entry {
            up: ifaddr
                .flags
                .contains(InterfaceFlags::IFF_UP | InterfaceFlags::IFF_RUNNING),
            loopback: ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK),
            addr: classify(ifaddr.address.as_ref(), ifaddr.netmask.as_ref()),
            name: ifaddr.interface_name,
        })))
    }
}

/// Platform-neutral view of one `getifaddrs` entry.
#[derive(Debug, Clone)]
struct Entry {
    name: String,
    up: bool,
    loopback: bool,
    addr: EntryAddr,
}

#[derive(Debug, Clone, Copy)]
enum EntryAddr {
    V4 {
        addr: Ipv4Addr,
        mask: Ipv4Addr,
    },
    V6 {
        addr: Ipv6Addr,
        mask: Ipv6Addr,
        scope_id: u32,
    },
    Link(MacAddress),
    Other,
}

fn classify(address: Option<&SockaddrStorage>, netmask: Option<&SockaddrStorage>) -> EntryAddr {
    let Some(address) = address else {
        return EntryAddr::Other;
    };

    if let Some(sin) = address.as_sockaddr_in() {
        let mask = netmask
            .and_then(SockaddrStorage::as_sockaddr_in)
            .map_or(Ipv4Addr::UNSPECIFIED, |m| m.ip());
        return EntryAddr::V4 {
            addr: sin.ip(),
            mask,
        };
    }

    if let Some(sin6) = address.as_sockaddr_in6() {
        let mask = netmask
            .and_then(SockaddrStorage::as_sockaddr_in6)
            .map_or(Ipv6Addr::UNSPECIFIED, |m| m.ip());
        return EntryAddr::V6 {
            addr: sin6.ip(),
            mask,
            scope_id: sin6.scope_id(),
        };
    }

    link_address(address).map_or(EntryAddr::Other, EntryAddr::Link)
}

#[cfg(any(
    target_os = "android",
    target_os = "linux",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
fn link_address(address: &SockaddrStorage) -> Option<MacAddress> {
    address
        .as_link_addr()
        .and_then(nix::sys::socket::LinkAddr::addr)
        .map(MacAddress::new)
}

#[cfg(not(any(
    target_os = "android",
    target_os = "linux",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
)))]
fn link_address(_address: &SockaddrStorage) -> Option<MacAddress> {
    None
}

/// Groups raw entries into a snapshot.
///
/// Groups appear in first-seen order of their IP records; MAC addresses are
/// resolved after all entries are read, since link-layer entries may come
/// before or after the IP entries of the same interface.
fn group_entries(entries: impl IntoIterator<Item = Entry>) -> InterfaceSnapshot {
    let mut macs: Vec<(String, MacAddress)> = Vec::new();
    let mut groups: Vec<InterfaceGroup> = Vec::new();

    for entry in entries {
        if !entry.up {
            continue;
        }

        let record = match entry.addr {
            EntryAddr::Link(mac) => {
                if !macs.iter().any(|(name, _)| *name == entry.name) {
                    macs.push((entry.name, mac));
                }
                continue;
            }
            EntryAddr::Other => continue,
            EntryAddr::V4 { addr, mask } => {
                InterfaceAddress::v4(addr, mask, MacAddress::UNSPECIFIED, entry.loopback)
            }
            EntryAddr::V6 {
                addr,
                mask,
                scope_id,
            } => InterfaceAddress::v6(addr, mask, MacAddress::UNSPECIFIED, entry.loopback, scope_id),
        };

        match groups.iter_mut().find(|g| g.name == entry.name) {
            Some(group) => group.addresses.push(record),
            None => groups.push(InterfaceGroup::new(entry.name, vec![record])),
        }
    }

    for group in &mut groups {
        let Some((_, mac)) = macs.iter().find(|(name, _)| *name == group.name) else {
            continue;
        };
        for record in &mut group.addresses {
            record.mac = *mac;
        }
    }

    InterfaceSnapshot::new(groups)
}
