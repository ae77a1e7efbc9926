//! Network change notifier
//!
//! A library for detecting changes to the host's network interfaces by
//! periodically polling them and comparing a filtered, serialized view.

pub mod config;
pub mod network;
pub mod notifier;
