//! Windows interface enumeration using `GetAdaptersAddresses`.

use crate::network::{
    FetchError, InterfaceAddress, InterfaceEnumerator, InterfaceGroup, InterfaceSnapshot,
    MacAddress, ipv4_netmask, ipv6_netmask,
};
use std::net::{Ipv4Addr, Ipv6Addr};
use windows::Win32::Foundation::WIN32_ERROR;
use windows::Win32::NetworkManagement::IpHelper::{
    GAA_FLAG_SKIP_ANYCAST, GAA_FLAG_SKIP_DNS_SERVER, GAA_FLAG_SKIP_MULTICAST, GetAdaptersAddresses,
    IF_TYPE_SOFTWARE_LOOPBACK, IP_ADAPTER_ADDRESSES_LH, IP_ADAPTER_UNICAST_ADDRESS_LH,
};
use windows::Win32::NetworkManagement::Ndis::IfOperStatusUp;
use windows::Win32::Networking::WinSock::{
    AF_INET, AF_INET6, AF_UNSPEC, SOCKADDR_IN, SOCKADDR_IN6,
};

/// Buffer size hint for `GetAdaptersAddresses`.
/// The API will tell us the actual required size if this is insufficient.
const INITIAL_BUFFER_SIZE: u32 = 16384;

/// Windows implementation of [`InterfaceEnumerator`] using `GetAdaptersAddresses`.
///
/// Each operationally-up adapter becomes one group named after its friendly
/// name; its unicast addresses become the group's records.
///
/// # Example
///
/// ```no_run
/// use net_change_notifier::network::InterfaceEnumerator;
/// use net_change_notifier::network::platform::WindowsEnumerator;
///
/// let snapshot = WindowsEnumerator::new().fetch().expect("Failed to fetch adapters");
///
/// for group in snapshot.groups() {
///     println!("{}: {:?}", group.name, group.addresses);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct WindowsEnumerator {
    _private: (),
}

impl WindowsEnumerator {
    /// Creates a new Windows interface enumerator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl InterfaceEnumerator for WindowsEnumerator {
    fn fetch(&self) -> Result<InterfaceSnapshot, FetchError> {
        fetch_adapters()
    }
}

/// Fetches all adapters using `GetAdaptersAddresses`.
fn fetch_adapters() -> Result<InterfaceSnapshot, FetchError> {
    let raw_adapters = get_adapter_addresses()?;

    let mut groups = Vec::new();
    // SAFETY: GetAdaptersAddresses returns a properly aligned buffer for IP_ADAPTER_ADDRESSES_LH.
    #[allow(clippy::cast_ptr_alignment)]
    let mut current = raw_adapters.as_ptr().cast::<IP_ADAPTER_ADDRESSES_LH>();

    // SAFETY: We iterate through a linked list returned by GetAdaptersAddresses.
    // The list is valid as long as the buffer (`raw_adapters`) is alive.
    while !current.is_null() {
        let adapter = unsafe { &*current };

        if let Some(group) = parse_adapter(adapter) {
            groups.push(group);
        }

        current = adapter.Next;
    }

    Ok(InterfaceSnapshot::new(groups))
}

/// Calls `GetAdaptersAddresses` and returns the raw buffer containing adapter data.
///
/// Handles the two-call pattern: estimated buffer first, then a retry with
/// the exact size if the buffer was too small.
fn get_adapter_addresses() -> Result<Vec<u8>, FetchError> {
    let flags = GAA_FLAG_SKIP_ANYCAST | GAA_FLAG_SKIP_MULTICAST | GAA_FLAG_SKIP_DNS_SERVER;
    let family = u32::from(AF_UNSPEC.0);

    let mut buffer: Vec<u8> = vec![0u8; INITIAL_BUFFER_SIZE as usize];
    let mut size = INITIAL_BUFFER_SIZE;

    // SAFETY: We provide a valid buffer and size. The function writes adapter
    // information to the buffer and updates `size` with the required length.
    let result = unsafe {
        GetAdaptersAddresses(
            family,
            flags,
            None,
            Some(buffer.as_mut_ptr().cast()),
            &raw mut size,
        )
    };

    handle_api_result(result, &mut buffer, &mut size, flags, family)?;

    Ok(buffer)
}

/// Handles the result of `GetAdaptersAddresses`, retrying once with a larger buffer.
///
/// Excluded from coverage: the overflow and failure paths need real API failures.
#[cfg(not(tarpaulin_include))]
fn handle_api_result(
    result: u32,
    buffer: &mut Vec<u8>,
    size: &mut u32,
    flags: windows::Win32::NetworkManagement::IpHelper::GET_ADAPTERS_ADDRESSES_FLAGS,
    family: u32,
) -> Result<(), FetchError> {
    use windows::Win32::Foundation::{ERROR_BUFFER_OVERFLOW, NO_ERROR};

    if result == ERROR_BUFFER_OVERFLOW.0 {
        buffer.resize(*size as usize, 0);

        // SAFETY: Same as above, but with correctly sized buffer
        let result = unsafe {
            GetAdaptersAddresses(
                family,
                flags,
                None,
                Some(buffer.as_mut_ptr().cast()),
                &raw mut *size,
            )
        };

        if result != NO_ERROR.0 {
            return Err(windows::core::Error::from(WIN32_ERROR(result)).into());
        }
    } else if result != NO_ERROR.0 {
        return Err(windows::core::Error::from(WIN32_ERROR(result)).into());
    }

    Ok(())
}

/// Parses one adapter into an [`InterfaceGroup`].
///
/// Returns `None` for adapters that are not up or whose name cannot be read.
fn parse_adapter(adapter: &IP_ADAPTER_ADDRESSES_LH) -> Option<InterfaceGroup> {
    if adapter.OperStatus != IfOperStatusUp {
        return None;
    }

    let name = unsafe { adapter.FriendlyName.to_string().ok()? };
    let internal = is_internal(adapter.IfType);
    let mac = physical_address(adapter);

    Some(InterfaceGroup::new(
        name,
        collect_addresses(adapter, mac, internal),
    ))
}

/// Software loopback adapters are the only internal ones.
const fn is_internal(if_type: u32) -> bool {
    if_type == IF_TYPE_SOFTWARE_LOOPBACK
}

fn physical_address(adapter: &IP_ADAPTER_ADDRESSES_LH) -> MacAddress {
    let len = (adapter.PhysicalAddressLength as usize).min(adapter.PhysicalAddress.len());
    MacAddress::from_slice(&adapter.PhysicalAddress[..len]).unwrap_or(MacAddress::UNSPECIFIED)
}

/// Collects unicast address records from an adapter.
///
/// # Safety Note
///
/// The pointer casts to `SOCKADDR_IN` and `SOCKADDR_IN6` are allowed despite alignment
/// concerns because Windows guarantees proper alignment of these structures.
#[allow(clippy::cast_ptr_alignment)]
fn collect_addresses(
    adapter: &IP_ADAPTER_ADDRESSES_LH,
    mac: MacAddress,
    internal: bool,
) -> Vec<InterfaceAddress> {
    let mut records = Vec::new();
    let mut unicast = adapter.FirstUnicastAddress;

    // SAFETY: We iterate through a linked list of unicast addresses.
    // Each address is valid as long as the parent adapter buffer is alive.
    while !unicast.is_null() {
        let entry: &IP_ADAPTER_UNICAST_ADDRESS_LH = unsafe { &*unicast };
        let prefix = entry.OnLinkPrefixLength;

        // SAFETY: The Address field contains a valid SOCKET_ADDRESS structure
        // pointing to either SOCKADDR_IN (IPv4) or SOCKADDR_IN6 (IPv6).
        if let Some(sockaddr) = unsafe { entry.Address.lpSockaddr.as_ref() } {
            match sockaddr.sa_family {
                f if f == AF_INET => {
                    // SAFETY: We verified the family is AF_INET, so this is a valid cast.
                    let sockaddr_in =
                        unsafe { &*(std::ptr::from_ref(sockaddr).cast::<SOCKADDR_IN>()) };
                    // SAFETY: sin_addr contains the IPv4 address bytes in network order.
                    let octets = unsafe { sockaddr_in.sin_addr.S_un.S_un_b };
                    let addr = Ipv4Addr::new(octets.s_b1, octets.s_b2, octets.s_b3, octets.s_b4);
                    records.push(InterfaceAddress::v4(addr, ipv4_netmask(prefix), mac, internal));
                }
                f if f == AF_INET6 => {
                    // SAFETY: We verified the family is AF_INET6, so this is a valid cast.
                    let sockaddr_in6 =
                        unsafe { &*(std::ptr::from_ref(sockaddr).cast::<SOCKADDR_IN6>()) };
                    // SAFETY: We verified this is an IPv6 address, so the union fields are valid.
                    let octets = unsafe { sockaddr_in6.sin6_addr.u.Byte };
                    let scope_id = unsafe { sockaddr_in6.Anonymous.sin6_scope_id };
                    records.push(InterfaceAddress::v6(
                        Ipv6Addr::from(octets),
                        ipv6_netmask(prefix),
                        mac,
                        internal,
                        scope_id,
                    ));
                }
                // Windows only returns AF_INET or AF_INET6 for unicast addresses
                _ => {}
            }
        }

        unicast = unsafe { (*unicast).Next };
    }

    records
}
