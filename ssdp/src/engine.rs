//! The protocol coordinator: the piece a host actually drives.
//!
//! `Engine` owns the interface snapshot, the receive socket, the
//! neighbor table and the header configuration, and exposes the
//! operation table the host's main loop calls into. It never spawns
//! threads and never blocks beyond a single non-blocking `recv`.

use crate::config::Config;
use crate::error::{Error, Syscall};
use crate::message::{self, Method};
use crate::neighbor::{NeighborRecord, NeighborTable};
use crate::udp::{self, ReceiveSocket};
use lssdp_netif::{InterfaceRecord, LogSink};
use std::net::SocketAddrV4;
use std::time::{SystemTime, UNIX_EPOCH};

fn now_ms() -> Result<u64, Error> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .map_err(|_| Error::Syscall(Syscall::Now, std::io::Error::other("system clock went backwards")))
}

impl LogSink for () {
    fn log(&self, _record: &lssdp_netif::LogRecord<'_>) {}
}

/// The SSDP protocol coordinator for one peer identity.
///
/// `L` is the log sink; pass `()` if you don't want logging (it
/// implements [`LogSink`] as a no-op so `Engine<()>` is always
/// available without reaching for an `Option` at the type level).
pub struct Engine<L: LogSink = ()> {
    config: Config,
    log: Option<L>,
    interfaces: Vec<InterfaceRecord>,
    neighbors: NeighborTable,
    socket: Option<ReceiveSocket>,
    on_interface_changed: Option<Box<dyn Fn()>>,
    on_neighbor_list_changed: Option<Box<dyn Fn()>>,
    on_packet_received: Option<Box<dyn Fn(&[u8])>>,
}

impl<L: LogSink> Engine<L> {
    pub fn new(config: Config, log: Option<L>) -> Self {
        Engine {
            config,
            log,
            interfaces: Vec::new(),
            neighbors: NeighborTable::new(),
            socket: None,
            on_interface_changed: None,
            on_neighbor_list_changed: None,
            on_packet_received: None,
        }
    }

    fn log_ref(&self) -> Option<&dyn LogSink> {
        self.log.as_ref().map(|l| l as &dyn LogSink)
    }

    /// Re-enumerates local interfaces; fires the interface-changed
    /// callback exactly once if the snapshot differs from the
    /// previous one (including the very first call, against the
    /// zero-initialized prior snapshot).
    pub fn refresh_interfaces(&mut self) -> Result<bool, Error> {
        let new_list = lssdp_netif::enumerate(self.log_ref())?;
        let changed = new_list != self.interfaces;
        self.interfaces = new_list;
        if changed {
            if let Some(cb) = &self.on_interface_changed {
                cb();
            }
        }
        Ok(changed)
    }

    /// (Re)creates the receive socket. Idempotent: calling this twice
    /// leaves exactly one live descriptor, the old one having been
    /// dropped (and thus closed) before the new one is created.
    pub fn socket_create(&mut self) -> Result<(), Error> {
        self.socket = None;
        self.socket = Some(ReceiveSocket::create(self.config.port)?);
        Ok(())
    }

    /// The receive socket's file descriptor, for the host to register
    /// with its own selector/poller. `None` until `socket_create` has
    /// succeeded.
    #[cfg(unix)]
    pub fn receive_fd(&self) -> Option<std::os::unix::io::RawFd> {
        self.socket.as_ref().map(ReceiveSocket::as_raw_fd)
    }

    fn is_own_address(&self, ip: std::net::Ipv4Addr) -> bool {
        self.interfaces.iter().any(|i| i.ip == ip)
    }

    /// Reads and dispatches a single datagram, if one is ready.
    ///
    /// Packets whose source matches one of this instance's own
    /// interface addresses (self-echo) are dropped with no parse
    /// attempt and no callback at all, per the self-echo invariant.
    pub fn read(&mut self) -> Result<(), Error> {
        let Some(socket) = &self.socket else {
            return Ok(());
        };
        let mut buf = [0u8; 2048];
        let Some((n, from)) = socket.recv(&mut buf)? else {
            return Ok(());
        };

        if self.is_own_address(*from.ip()) {
            return Ok(());
        }

        if let Some(cb) = &self.on_packet_received {
            cb(&buf[..n]);
        }

        let timestamp = now_ms()?;
        let packet = match message::parse(&buf[..n], timestamp) {
            Ok(p) => p,
            Err(_) => {
                crate::log_warn!(self.log_ref(), "unknown SSDP packet");
                crate::log_debug!(self.log_ref(), "{:?}", String::from_utf8_lossy(&buf[..n]));
                return Ok(());
            }
        };

        if packet.st != self.config.header.st {
            return Ok(());
        }

        match packet.method {
            Method::MSearch => {
                if let Err(e) = self.send_response(from) {
                    crate::log_error!(self.log_ref(), "send_response to {}: {e}", from.ip());
                }
            }
            Method::Notify | Method::Response => {
                if self.neighbors.observe(&packet, self.log_ref()) {
                    if let Some(cb) = &self.on_neighbor_list_changed {
                        cb();
                    }
                }
            }
        }

        Ok(())
    }

    fn sendable_interfaces(&self) -> impl Iterator<Item = &InterfaceRecord> {
        self.interfaces
            .iter()
            .filter(|i| !i.name.is_empty() && !i.ip.is_loopback())
    }

    fn location_for(&self, interface: &InterfaceRecord) -> String {
        let loc = &self.config.header.location;
        let host = if loc.host.is_empty() {
            interface.ip.to_string()
        } else {
            loc.host.clone()
        };
        message::build_location(&host, loc.port, &loc.uri)
    }

    /// Sends one `M-SEARCH` from every non-loopback interface.
    pub fn send_msearch(&self) -> Result<(), Error> {
        let mut buf = [0u8; 2048];
        let n = message::build_msearch(&mut buf, self.config.port, &self.config.header.st);
        for interface in self.sendable_interfaces() {
            if let Err(e) = udp::send_datagram(interface, self.config.port, &buf[..n]) {
                crate::log_error!(self.log_ref(), "send_msearch on {}: {e}", interface.name);
            }
        }
        Ok(())
    }

    /// Sends one `NOTIFY` per non-loopback interface, each with its
    /// own `LOCATION`.
    pub fn send_notify(&self) -> Result<(), Error> {
        for interface in self.sendable_interfaces() {
            let location = self.location_for(interface);
            let mut buf = [0u8; 2048];
            let n = message::build_notify(
                &mut buf,
                self.config.port,
                &self.config.header.st,
                &self.config.header.usn,
                &location,
                &self.config.header.sm_id,
                &self.config.header.device_type,
            );
            if let Err(e) = udp::send_datagram(interface, self.config.port, &buf[..n]) {
                crate::log_error!(self.log_ref(), "send_notify on {}: {e}", interface.name);
            }
        }
        Ok(())
    }

    fn send_response(&self, requester: SocketAddrV4) -> Result<(), Error> {
        let Some(interface) = self
            .interfaces
            .iter()
            .find(|i| i.shares_slash_24(*requester.ip()))
        else {
            crate::log_debug!(self.log_ref(), "{:?}", self.interfaces);
            return Err(Error::NoMatchingInterface);
        };

        let location = self.location_for(interface);
        let Some(socket) = &self.socket else {
            return Err(Error::InvalidArgument("no receive socket to reply on"));
        };
        let mut buf = [0u8; 2048];
        let n = message::build_response(
            &mut buf,
            &self.config.header.st,
            &self.config.header.usn,
            &location,
            &self.config.header.sm_id,
            &self.config.header.device_type,
        );
        let dest = SocketAddrV4::new(*requester.ip(), self.config.port);
        socket.reply_to(dest, &buf[..n])
    }

    /// Evicts timed-out neighbors, firing the neighbor-list-changed
    /// callback once per eviction.
    pub fn check_timeouts(&mut self) -> Result<(), Error> {
        let now = now_ms()?;
        let evicted = self
            .neighbors
            .sweep(now, self.config.neighbor_timeout_ms, self.log_ref());
        for _ in 0..evicted {
            if let Some(cb) = &self.on_neighbor_list_changed {
                cb();
            }
        }
        Ok(())
    }

    pub fn neighbors(&self) -> &[NeighborRecord] {
        self.neighbors.as_slice()
    }

    pub fn interfaces(&self) -> &[InterfaceRecord] {
        &self.interfaces
    }

    pub fn set_interface_changed_callback(&mut self, f: impl Fn() + 'static) {
        self.on_interface_changed = Some(Box::new(f));
    }

    pub fn set_neighbor_list_changed_callback(&mut self, f: impl Fn() + 'static) {
        self.on_neighbor_list_changed = Some(Box::new(f));
    }

    pub fn set_packet_received_callback(&mut self, f: impl Fn(&[u8]) + 'static) {
        self.on_packet_received = Some(Box::new(f));
    }
}
