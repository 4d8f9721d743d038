//! The multicast socket manager: one long-lived receive socket, plus
//! transient per-interface send sockets.

use crate::error::{Error, Syscall};
use lssdp_netif::InterfaceRecord;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::net::{Ipv4Addr, SocketAddrV4};

/// SSDP's well-known multicast group.
pub const MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

fn syscall_err(call: Syscall) -> impl FnOnce(std::io::Error) -> Error {
    move |e| Error::Syscall(call, e)
}

/// The single receive socket: bound to the configured port, joined to
/// [`MULTICAST_GROUP`], non-blocking.
pub struct ReceiveSocket {
    socket: Socket,
}

impl ReceiveSocket {
    /// Implements the five steps of socket creation. Idempotent: if a
    /// socket already exists it is replaced, never leaked.
    pub fn create(port: u16) -> Result<Self, Error> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(syscall_err(Syscall::SocketCreate))?;
        socket
            .set_nonblocking(true)
            .map_err(syscall_err(Syscall::SetSockOpt))?;
        socket
            .set_reuse_address(true)
            .map_err(syscall_err(Syscall::SetSockOpt))?;
        let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
        socket
            .bind(&SockAddr::from(bind_addr))
            .map_err(syscall_err(Syscall::Bind))?;
        socket
            .join_multicast_v4(&MULTICAST_GROUP, &Ipv4Addr::UNSPECIFIED)
            .map_err(syscall_err(Syscall::JoinMulticast))?;
        Ok(ReceiveSocket { socket })
    }

    /// Reads up to one 2048-byte datagram, non-blocking.
    ///
    /// `Ok(None)` means there was nothing to read (`WouldBlock`); any
    /// other I/O error is reported.
    pub fn recv(&self, buf: &mut [u8; 2048]) -> Result<Option<(usize, SocketAddrV4)>, Error> {
        use std::io::ErrorKind;
        use std::mem::MaybeUninit;

        let mut uninit = [MaybeUninit::new(0u8); 2048];
        match self.socket.recv_from(&mut uninit) {
            Ok((n, addr)) => {
                for (dst, src) in buf[..n].iter_mut().zip(&uninit[..n]) {
                    *dst = unsafe { src.assume_init() };
                }
                let from = addr
                    .as_socket_ipv4()
                    .ok_or(Error::InvalidArgument("non-IPv4 source address"))?;
                Ok(Some((n, from)))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(Error::Syscall(Syscall::Recvfrom, e)),
        }
    }

    /// Replies directly to `dest` over the live receive socket. The
    /// caller is responsible for rewriting the destination port to
    /// the configured SSDP port before calling this (the port of the
    /// requester's ephemeral source socket is not the right target).
    pub fn reply_to(&self, dest: SocketAddrV4, payload: &[u8]) -> Result<(), Error> {
        self.socket
            .send_to(payload, &SockAddr::from(dest))
            .map(|_| ())
            .map_err(syscall_err(Syscall::Sendto))
    }

    #[cfg(unix)]
    pub fn as_raw_fd(&self) -> std::os::unix::io::RawFd {
        use std::os::unix::io::AsRawFd;
        self.socket.as_raw_fd()
    }
}

/// Sends one datagram out of `interface` via a transient socket bound
/// to that interface's address, with `IP_MULTICAST_LOOP` disabled so
/// the sender never has to filter its own multicast traffic back out
/// at the receive socket (self-echo is still filtered defensively by
/// the coordinator, per the interface-IP check).
///
/// Loopback and empty-name interfaces are the caller's responsibility
/// to skip; this function sends unconditionally.
pub fn send_datagram(interface: &InterfaceRecord, port: u16, payload: &[u8]) -> Result<(), Error> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(syscall_err(Syscall::SocketCreate))?;
    socket
        .bind(&SockAddr::from(SocketAddrV4::new(interface.ip, 0)))
        .map_err(syscall_err(Syscall::Bind))?;
    socket
        .set_multicast_loop_v4(false)
        .map_err(syscall_err(Syscall::SetSockOpt))?;
    let dest = SocketAddrV4::new(MULTICAST_GROUP, port);
    socket
        .send_to(payload, &SockAddr::from(dest))
        .map(|_| ())
        .map_err(syscall_err(Syscall::Sendto))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn create_then_create_leaves_one_live_socket() {
        let first = ReceiveSocket::create(19100).expect("first create should succeed");
        drop(first);
        let second = ReceiveSocket::create(19100).expect("second create should also succeed");
        drop(second);
    }

    #[test]
    #[serial]
    fn recv_with_nothing_sent_is_none() {
        let socket = ReceiveSocket::create(19101).unwrap();
        let mut buf = [0u8; 2048];
        assert!(socket.recv(&mut buf).unwrap().is_none());
    }

    #[test]
    #[serial]
    fn loopback_send_and_receive_round_trip() {
        let receiver = ReceiveSocket::create(19102).unwrap();
        let loopback = InterfaceRecord {
            name: "lo".into(),
            ip: Ipv4Addr::LOCALHOST,
            raw_addr: u32::from(Ipv4Addr::LOCALHOST),
            netmask: u32::from(Ipv4Addr::new(255, 0, 0, 0)),
        };
        send_datagram(&loopback, 19102, b"hello").unwrap();

        std::thread::sleep(std::time::Duration::from_millis(50));
        let mut buf = [0u8; 2048];
        let (n, _from) = receiver
            .recv(&mut buf)
            .unwrap()
            .expect("the datagram should have arrived by now");
        assert_eq!(&buf[..n], b"hello");
    }
}
