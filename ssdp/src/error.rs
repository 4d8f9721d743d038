//! Error types for the protocol engine.

use std::fmt;

/// The syscall (or syscall-equivalent library call) that failed.
#[derive(Debug)]
#[non_exhaustive]
pub enum Syscall {
    GetInterfaces,
    SocketCreate,
    Bind,
    SetSockOpt,
    JoinMulticast,
    Sendto,
    Recvfrom,
    Now,
}

impl fmt::Display for Syscall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Syscall::GetInterfaces => "get_interfaces",
            Syscall::SocketCreate => "socket",
            Syscall::Bind => "bind",
            Syscall::SetSockOpt => "setsockopt",
            Syscall::JoinMulticast => "join_multicast",
            Syscall::Sendto => "sendto",
            Syscall::Recvfrom => "recvfrom",
            Syscall::Now => "now",
        };
        f.write_str(s)
    }
}

/// Failure modes of the engine's public operations.
///
/// Every public [`crate::engine::Engine`] method returns `Result<_,
/// Error>` rather than the reference implementation's `0`/negative
/// return convention; the engine remains usable after any of these.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A caller-supplied argument was invalid (e.g. an out-of-range
    /// port, or a zero-length search target).
    InvalidArgument(&'static str),

    /// An OS call failed.
    Syscall(Syscall, std::io::Error),

    /// `send_response` found no local interface sharing a /24 with the
    /// requester; nothing was sent.
    NoMatchingInterface,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Error::Syscall(call, e) => write!(f, "{call} failed: {e}"),
            Error::NoMatchingInterface => {
                write!(f, "no local interface shares a LAN with the requester")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Syscall(_, e) => Some(e),
            _ => None,
        }
    }
}

impl From<lssdp_netif::Error> for Error {
    fn from(e: lssdp_netif::Error) -> Self {
        match e {
            lssdp_netif::Error::Syscall(_, io) => Error::Syscall(Syscall::GetInterfaces, io.into()),
            // lssdp_netif::Error is #[non_exhaustive]; a future variant
            // still has to become some Error here.
            _ => Error::Syscall(
                Syscall::GetInterfaces,
                std::io::Error::other("interface enumeration failed"),
            ),
        }
    }
}
