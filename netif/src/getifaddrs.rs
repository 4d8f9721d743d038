//! Synchronous enumeration of the host's IPv4 interfaces, via
//! `getifaddrs(3)`.

use crate::{
    error::{Error, Syscall},
    log::LogSink,
    InterfaceRecord, INTERFACE_NAME_MAX, MAX_INTERFACES,
};
use nix::ifaddrs::getifaddrs;
use nix::sys::socket::SockaddrLike;
use std::net::Ipv4Addr;

fn to_ipv4(addr: &dyn SockaddrLike) -> Option<Ipv4Addr> {
    let sin = addr.as_sockaddr_in()?;
    Some(Ipv4Addr::from(sin.ip()))
}

/// Lists the host's current IPv4 interfaces.
///
/// Interfaces without an IPv4 address, and the loopback-only `lo`
/// interface's non-loopback siblings notwithstanding, are skipped;
/// loopback itself is returned like any other interface, since a
/// caller testing entirely on one host wants to see it.
///
/// At most [`MAX_INTERFACES`] interfaces are returned; any beyond that
/// are dropped, with a warning logged through `log` (if given) for
/// each dropped interface, mirroring the reference daemon's own
/// `LSSDP_INTERFACE_LIST_SIZE` overflow handling.
pub fn enumerate(log: Option<&dyn LogSink>) -> Result<Vec<InterfaceRecord>, Error> {
    let addrs = getifaddrs().map_err(|e| Error::Syscall(Syscall::GetIfAddrs, e))?;

    let mut result = Vec::new();

    for ifaddr in addrs {
        let Some(address) = ifaddr.address.as_ref() else {
            continue;
        };
        let Some(ip) = to_ipv4(address) else {
            continue;
        };
        let netmask = ifaddr
            .netmask
            .as_ref()
            .and_then(to_ipv4)
            .unwrap_or(Ipv4Addr::UNSPECIFIED);

        if result.len() >= MAX_INTERFACES {
            crate::log_warn!(
                log,
                "too many interfaces, dropping {} ({ip})",
                ifaddr.interface_name
            );
            continue;
        }

        let mut name = ifaddr.interface_name;
        if name.len() > INTERFACE_NAME_MAX {
            name.truncate(INTERFACE_NAME_MAX);
        }

        result.push(InterfaceRecord {
            name,
            ip,
            raw_addr: u32::from(ip),
            netmask: u32::from(netmask),
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_host_has_at_least_loopback() {
        let list = enumerate(None).expect("getifaddrs should not fail in a test sandbox");
        assert!(
            list.iter().any(|i| i.ip.is_loopback()),
            "expected a loopback interface among {list:?}"
        );
    }

    #[test]
    fn shares_slash_24_matches_same_prefix_only() {
        let iface = InterfaceRecord {
            name: "eth0".into(),
            ip: Ipv4Addr::new(192, 168, 1, 5),
            raw_addr: u32::from(Ipv4Addr::new(192, 168, 1, 5)),
            netmask: u32::from(Ipv4Addr::new(255, 255, 255, 0)),
        };
        assert!(iface.shares_slash_24(Ipv4Addr::new(192, 168, 1, 200)));
        assert!(!iface.shares_slash_24(Ipv4Addr::new(192, 168, 2, 200)));
    }
}
