//! Enumerating local IPv4 network interfaces.
//!
//! The netif crate is the small, synchronous half of a LAN service
//! discovery peer: it answers "what IPv4 interfaces does this host
//! have right now, and what are their addresses and netmasks", and
//! gives callers somewhere to send a log line about it.
//!
//! It deliberately does not watch for interface changes itself; a
//! caller that wants that polls [`enumerate`] on whatever schedule
//! suits it and diffs the result.

pub mod error;
pub mod getifaddrs;
pub mod log;

pub use error::{Error, Syscall};
pub use getifaddrs::enumerate;
pub use log::{LogLevel, LogRecord, LogSink};

/// Interfaces beyond this count are dropped, with a warning logged for
/// each one. Matches the fixed-size interface table of the original
/// lssdp daemon, which callers on the wire still expect.
pub const MAX_INTERFACES: usize = 16;

/// Interface names longer than this are truncated.
pub const INTERFACE_NAME_MAX: usize = 15;

/// One IPv4-addressed network interface, as seen at enumeration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRecord {
    /// Interface name, e.g. "eth0". Truncated to [`INTERFACE_NAME_MAX`]
    /// bytes if longer.
    pub name: String,

    /// The interface's IPv4 address.
    pub ip: std::net::Ipv4Addr,

    /// `ip`, as a big-endian u32, for cheap prefix comparisons.
    pub raw_addr: u32,

    /// The interface's IPv4 netmask, as a big-endian u32.
    pub netmask: u32,
}

impl InterfaceRecord {
    /// True if `addr` falls in this interface's /24, the same coarse
    /// same-LAN test the reference implementation uses instead of a
    /// true netmask comparison.
    pub fn shares_slash_24(&self, addr: std::net::Ipv4Addr) -> bool {
        let mask: u32 = 0xffff_ff00;
        (self.raw_addr & mask) == (u32::from(addr) & mask)
    }
}
