//! A lightweight SSDP peer for LAN service discovery.
//!
//! Advertises a service (`NOTIFY`, replies to `M-SEARCH`) and
//! discovers others (`M-SEARCH`, parses `NOTIFY`/`RESPONSE`,
//! maintains a neighbor list with timeout eviction) on multi-homed
//! IPv4 hosts. The engine is single-threaded and cooperative: the
//! host drives every operation and supplies its own timer and main
//! loop, registering the receive socket's descriptor with whatever
//! selector it already uses.

pub mod config;
pub mod engine;
pub mod error;
pub mod message;
pub mod neighbor;
pub mod udp;

pub use config::{Config, HeaderConfig, LocationConfig};
pub use engine::Engine;
pub use error::{Error, Syscall};
pub use lssdp_netif::{log_debug, log_error, log_warn, LogLevel, LogRecord, LogSink};
pub use neighbor::NeighborRecord;
