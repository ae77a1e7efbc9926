//! Shared test fixtures for notifier tests.

use crate::network::{
    FetchError, InterfaceAddress, InterfaceEnumerator, InterfaceGroup, InterfaceSnapshot,
    MacAddress,
};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock enumerator whose result can be switched while a notifier polls it.
///
/// Clones share state, so a test keeps one clone and hands the other to
/// the notifier.
#[derive(Clone)]
pub struct MockEnumerator {
    current: Arc<Mutex<Option<InterfaceSnapshot>>>,
    calls: Arc<AtomicUsize>,
}

impl MockEnumerator {
    pub fn returning(snapshot: InterfaceSnapshot) -> Self {
        Self {
            current: Arc::new(Mutex::new(Some(snapshot))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes subsequent fetches return `snapshot`.
    pub fn set(&self, snapshot: InterfaceSnapshot) {
        *self.current.lock().unwrap() = Some(snapshot);
    }

    /// Makes subsequent fetches fail.
    pub fn fail(&self) {
        *self.current.lock().unwrap() = None;
    }

    /// Number of fetches so far, baseline included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InterfaceEnumerator for MockEnumerator {
    fn fetch(&self) -> Result<InterfaceSnapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| FetchError::Platform {
                message: "mock enumeration failure".to_string(),
            })
    }
}

/// Counts invocations of a change or error listener.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn loopback_records() -> Vec<InterfaceAddress> {
    vec![
        InterfaceAddress::v4(
            Ipv4Addr::LOCALHOST,
            Ipv4Addr::new(255, 0, 0, 0),
            MacAddress::UNSPECIFIED,
            true,
        ),
        InterfaceAddress::v6(
            Ipv6Addr::LOCALHOST,
            Ipv6Addr::from(u128::MAX),
            MacAddress::UNSPECIFIED,
            true,
            0,
        ),
    ]
}

pub fn ethernet_record(last_octet: u8) -> InterfaceAddress {
    InterfaceAddress::v4(
        Ipv4Addr::new(192, 168, 1, last_octet),
        Ipv4Addr::new(255, 255, 255, 0),
        MacAddress::new([0x01, 0x02, 0x03, 0x0a, 0x0b, 0x0c]),
        false,
    )
}

/// A loopback group followed by one external ethernet group.
pub fn snapshot_with(last_octet: u8) -> InterfaceSnapshot {
    InterfaceSnapshot::new(vec![
        InterfaceGroup::new("lo", loopback_records()),
        InterfaceGroup::new("eth0", vec![ethernet_record(last_octet)]),
    ])
}

/// State "A".
pub fn snapshot_a() -> InterfaceSnapshot {
    snapshot_with(10)
}

/// State "B": the ethernet address changed.
pub fn snapshot_b() -> InterfaceSnapshot {
    snapshot_with(20)
}
