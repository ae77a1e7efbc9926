//! Platform-specific interface enumerator implementations.
//!
//! # Platform Support
//!
//! - **Unix**: `getifaddrs` via the `nix` crate ([`UnixEnumerator`]).
//! - **Windows**: `GetAdaptersAddresses` via the `windows` crate ([`WindowsEnumerator`]).
//!
//! [`PlatformEnumerator`] names whichever one the current target uses.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::UnixEnumerator;
#[cfg(windows)]
pub use windows::WindowsEnumerator;

#[cfg(unix)]
pub use unix::UnixEnumerator as PlatformEnumerator;
#[cfg(windows)]
pub use windows::WindowsEnumerator as PlatformEnumerator;
