//! Error types for interface enumeration.

use std::fmt;

/// The syscall (or syscall-equivalent libc wrapper) that failed.
#[derive(Debug)]
#[non_exhaustive]
pub enum Syscall {
    GetIfAddrs,
}

impl fmt::Display for Syscall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Syscall::GetIfAddrs => write!(f, "getifaddrs"),
        }
    }
}

/// Failure modes of [`crate::enumerate`].
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The underlying syscall failed.
    Syscall(Syscall, nix::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syscall(call, e) => write!(f, "{call} failed: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Syscall(_, e) => Some(e),
        }
    }
}
