//! Network layer: interface snapshots and the host enumeration facility.
//!
//! This module provides types and traits for:
//! - Representing address records ([`InterfaceAddress`], [`AddressFamily`], [`MacAddress`])
//! - Representing interface snapshots ([`InterfaceGroup`], [`InterfaceSnapshot`])
//! - Enumerating host interfaces ([`InterfaceEnumerator`], [`platform`])
//! - Filtering records and interfaces ([`AddressFilter`], [`filter`])

mod address;
mod enumerator;
pub mod filter;
pub mod platform;
mod snapshot;


pub use address::{
    AddressFamily, InterfaceAddress, IpVersion, MacAddress, ipv4_netmask, ipv6_netmask,
    netmask_from_prefix, prefix_len,
};
pub use enumerator::{FetchError, InterfaceEnumerator};
pub use filter::AddressFilter;
pub use snapshot::{InterfaceGroup, InterfaceSnapshot};
