//! Core types for interface address records.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize, Serializer};

/// IP version selection used by address filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    /// IPv4 addresses only.
    V4,
    /// IPv6 addresses only.
    V6,
    /// Both IPv4 and IPv6 addresses.
    Both,
}

impl IpVersion {
    /// Returns true if this version includes IPv4.
    #[must_use]
    pub const fn includes_v4(self) -> bool {
        matches!(self, Self::V4 | Self::Both)
    }

    /// Returns true if this version includes IPv6.
    #[must_use]
    pub const fn includes_v6(self) -> bool {
        matches!(self, Self::V6 | Self::Both)
    }

    /// Returns true if an address of `family` is selected by this version.
    #[must_use]
    pub const fn includes(self, family: AddressFamily) -> bool {
        match family {
            AddressFamily::V4 => self.includes_v4(),
            AddressFamily::V6 => self.includes_v6(),
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => write!(f, "IPv4"),
            Self::V6 => write!(f, "IPv6"),
            Self::Both => write!(f, "Both"),
        }
    }
}

/// Address family of a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    /// Internet Protocol version 4.
    #[serde(rename = "IPv4")]
    V4,
    /// Internet Protocol version 6.
    #[serde(rename = "IPv6")]
    V6,
}

impl AddressFamily {
    /// Returns the family of `addr`.
    #[must_use]
    pub const fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => write!(f, "IPv4"),
            Self::V6 => write!(f, "IPv6"),
        }
    }
}

/// A 48-bit hardware address.
///
/// Serializes as lowercase colon-separated hex (`00:1a:2b:3c:4d:5e`).
/// Interfaces without a hardware address use [`MacAddress::UNSPECIFIED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// The all-zero address reported for interfaces without link-layer info.
    pub const UNSPECIFIED: Self = Self([0; 6]);

    /// Creates a MAC address from its six octets.
    #[must_use]
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Creates a MAC address from a byte slice.
    ///
    /// Returns `None` unless the slice holds exactly six bytes.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 6]>::try_from(bytes).ok().map(Self)
    }

    /// Returns the six octets.
    #[must_use]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Returns true for the all-zero address.
    #[must_use]
    pub fn is_unspecified(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One address assigned to a network interface.
///
/// # Serialization
///
/// Fields serialize in declaration order: `address`, `netmask`, `family`,
/// `mac`, `internal`, `cidr`, then `scopeid` for IPv6 records only. This
/// order is part of the canonical snapshot encoding and must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceAddress {
    /// The assigned address.
    pub address: IpAddr,
    /// The network mask, in the same family as `address`.
    pub netmask: IpAddr,
    /// Address family.
    pub family: AddressFamily,
    /// Hardware address of the owning interface.
    pub mac: MacAddress,
    /// True for loopback and other addresses not reachable from outside the host.
    pub internal: bool,
    /// `address/prefix`, or `None` when the netmask is not contiguous.
    pub cidr: Option<String>,
    /// IPv6 scope identifier.
    #[serde(rename = "scopeid", skip_serializing_if = "Option::is_none")]
    pub scope_id: Option<u32>,
}

impl InterfaceAddress {
    /// Creates an IPv4 record.
    #[must_use]
    pub fn v4(address: Ipv4Addr, netmask: Ipv4Addr, mac: MacAddress, internal: bool) -> Self {
        Self::new(IpAddr::V4(address), IpAddr::V4(netmask), mac, internal, None)
    }

    /// Creates an IPv6 record.
    #[must_use]
    pub fn v6(
        address: Ipv6Addr,
        netmask: Ipv6Addr,
        mac: MacAddress,
        internal: bool,
        scope_id: u32,
    ) -> Self {
        Self::new(
            IpAddr::V6(address),
            IpAddr::V6(netmask),
            mac,
            internal,
            Some(scope_id),
        )
    }

    fn new(
        address: IpAddr,
        netmask: IpAddr,
        mac: MacAddress,
        internal: bool,
        scope_id: Option<u32>,
    ) -> Self {
        let cidr = prefix_len(&netmask).map(|len| format!("{address}/{len}"));
        Self {
            address,
            netmask,
            family: AddressFamily::of(&address),
            mac,
            internal,
            cidr,
            scope_id,
        }
    }

    /// Returns true if this is an IPv4 record.
    #[must_use]
    pub const fn is_ipv4(&self) -> bool {
        matches!(self.family, AddressFamily::V4)
    }

    /// Returns true if this is an IPv6 record.
    #[must_use]
    pub const fn is_ipv6(&self) -> bool {
        matches!(self.family, AddressFamily::V6)
    }

    /// Returns the prefix length of the netmask, if contiguous.
    #[must_use]
    pub fn prefix_len(&self) -> Option<u8> {
        prefix_len(&self.netmask)
    }
}

/// Builds the netmask for `prefix` leading one-bits in the given family.
///
/// Prefixes longer than the address width saturate to an all-ones mask.
#[must_use]
pub fn netmask_from_prefix(family: AddressFamily, prefix: u8) -> IpAddr {
    match family {
        AddressFamily::V4 => IpAddr::V4(ipv4_netmask(prefix)),
        AddressFamily::V6 => IpAddr::V6(ipv6_netmask(prefix)),
    }
}

/// IPv4 netmask with `prefix` leading one-bits.
#[must_use]
pub fn ipv4_netmask(prefix: u8) -> Ipv4Addr {
    let bits = u32::MAX
        .checked_shl(32 - u32::from(prefix.min(32)))
        .unwrap_or(0);
    Ipv4Addr::from(bits)
}

/// IPv6 netmask with `prefix` leading one-bits.
#[must_use]
pub fn ipv6_netmask(prefix: u8) -> Ipv6Addr {
    let bits = u128::MAX
        .checked_shl(128 - u32::from(prefix.min(128)))
        .unwrap_or(0);
    Ipv6Addr::from(bits)
}

/// Returns the number of leading one-bits of a contiguous netmask.
///
/// Returns `None` if the mask has a one-bit after its first zero-bit.
#[must_use]
pub fn prefix_len(netmask: &IpAddr) -> Option<u8> {
    let (ones, zeros) = match netmask {
        IpAddr::V4(mask) => {
            let bits = u32::from(*mask);
            (bits.leading_ones(), bits.trailing_zeros())
        }
        IpAddr::V6(mask) => {
            let bits = u128::from(*mask);
            (bits.leading_ones(), bits.trailing_zeros())
        }
    };
    let width = if netmask.is_ipv4() { 32 } else { 128 };

    // Contiguous: ones followed only by zeros.
    if ones + zeros == width {
        u8::try_from(ones).ok()
    } else {
        None
    }
}
