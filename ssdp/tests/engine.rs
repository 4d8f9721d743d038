//! End-to-end tests driving `Engine` over real loopback sockets.
//!
//! A "remote peer" is simulated with a raw socket bound to
//! `127.0.0.2`, an address in the loopback block that the engine's
//! own interface enumeration never reports (only configured
//! interfaces are returned, and nothing configures a `127.0.0.2`
//! alias). That keeps the fake peer's traffic from tripping the
//! engine's own self-echo filter, which would otherwise treat any
//! packet "from itself" (i.e. from `127.0.0.1`, which *is* one of the
//! engine's real interfaces) as an echo.

use lssdp_ssdp::{message, Config, Engine};
use std::cell::Cell;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::rc::Rc;
use std::time::Duration;

/// Binds at the *configured SSDP port*, not an ephemeral one: every
/// real peer's receive socket listens there, and `send_response`
/// always rewrites its destination to that port rather than whatever
/// ephemeral port sent the `M-SEARCH` (see `Engine::send_response`).
fn remote_peer(port: u16) -> UdpSocket {
    let socket = UdpSocket::bind((Ipv4Addr::new(127, 0, 0, 2), port)).unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    socket
}

fn new_engine(port: u16, st: &str, usn: &str) -> Engine<()> {
    let config = Config::new(st, usn)
        .with_port(port)
        .with_sm_id("1")
        .with_device_type("node")
        .with_location("", 5678, "");
    let mut engine: Engine<()> = Engine::new(config, None);
    engine.refresh_interfaces().expect("interface enumeration should work in a test sandbox");
    engine.socket_create().expect("binding a fresh loopback-only port should succeed");
    engine
}

fn read_until_delivered(engine: &mut Engine<()>) {
    for _ in 0..50 {
        engine.read().unwrap();
        std::thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn msearch_gets_a_unicast_response_with_substituted_location() {
    let mut engine = new_engine(19310, "ST_P2P", "nodeX");
    let peer = remote_peer(19310);

    let mut buf = [0u8; 512];
    let n = message::build_msearch(&mut buf, 19310, "ST_P2P");
    peer.send_to(&buf[..n], (Ipv4Addr::LOCALHOST, 19310)).unwrap();

    engine.read().unwrap();
    std::thread::sleep(Duration::from_millis(50));
    engine.read().unwrap();

    let (n, from) = peer.recv_from(&mut buf).expect("a RESPONSE should have arrived");
    assert_eq!(from, SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 19310)));
    let response = message::parse(&buf[..n], 1).unwrap();
    assert_eq!(response.method, message::Method::Response);
    assert_eq!(response.st, "ST_P2P");
    assert_eq!(response.location, "127.0.0.1:5678");

    assert!(engine.neighbors().is_empty(), "M-SEARCH must not populate the neighbor list");
}

#[test]
fn notify_is_absorbed_into_the_neighbor_list() {
    let mut engine = new_engine(19311, "ST_P2P", "nodeX");
    let changed = Rc::new(Cell::new(0));
    let counted = changed.clone();
    engine.set_neighbor_list_changed_callback(move || counted.set(counted.get() + 1));

    let peer = remote_peer(19311);
    let mut buf = [0u8; 512];
    let n = message::build_notify(&mut buf, 19311, "ST_P2P", "nodeY", "127.0.0.2:9999", "2", "node");
    peer.send_to(&buf[..n], (Ipv4Addr::LOCALHOST, 19311)).unwrap();

    read_until_delivered(&mut engine);

    assert_eq!(engine.neighbors().len(), 1);
    assert_eq!(engine.neighbors()[0].usn, "nodeY");
    assert_eq!(engine.neighbors()[0].location, "127.0.0.2:9999");
    assert_eq!(changed.get(), 1);
}

#[test]
fn packet_from_own_interface_is_dropped_before_any_callback() {
    let mut engine = new_engine(19312, "ST_P2P", "nodeX");
    engine.set_packet_received_callback(|_| panic!("self-echo must not reach any callback"));
    engine.set_neighbor_list_changed_callback(|| panic!("self-echo must not update neighbors"));

    // 127.0.0.1 is one of this engine's own (loopback) interfaces.
    let own = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let mut buf = [0u8; 512];
    let n = message::build_notify(&mut buf, 19312, "ST_P2P", "nodeX", "127.0.0.1:5678", "1", "node");
    own.send_to(&buf[..n], (Ipv4Addr::LOCALHOST, 19312)).unwrap();

    std::thread::sleep(Duration::from_millis(50));
    engine.read().unwrap();

    assert!(engine.neighbors().is_empty());
}

#[test]
fn mismatched_search_target_is_seen_but_not_absorbed() {
    let mut engine = new_engine(19313, "ST_P2P", "nodeX");
    let seen = Rc::new(Cell::new(false));
    let marked = seen.clone();
    engine.set_packet_received_callback(move |_| marked.set(true));

    let peer = remote_peer(19313);
    let mut buf = [0u8; 512];
    let n = message::build_notify(&mut buf, 19313, "ST_OTHER", "nodeY", "127.0.0.2:9999", "2", "node");
    peer.send_to(&buf[..n], (Ipv4Addr::LOCALHOST, 19313)).unwrap();

    read_until_delivered(&mut engine);

    assert!(engine.neighbors().is_empty());
    assert!(seen.get(), "packet_received should still fire for a non-self-echo packet");
}

#[test]
fn neighbor_times_out_and_fires_the_change_callback_once() {
    let config = Config::new("ST_P2P", "nodeX")
        .with_port(19314)
        .with_neighbor_timeout_ms(50)
        .with_location("", 5678, "");
    let mut engine: Engine<()> = Engine::new(config, None);
    engine.refresh_interfaces().unwrap();
    engine.socket_create().unwrap();

    let changed = Rc::new(Cell::new(0));
    let counted = changed.clone();
    engine.set_neighbor_list_changed_callback(move || counted.set(counted.get() + 1));

    let peer = remote_peer(19314);
    let mut buf = [0u8; 512];
    let n = message::build_notify(&mut buf, 19314, "ST_P2P", "nodeY", "127.0.0.2:9999", "2", "node");
    peer.send_to(&buf[..n], (Ipv4Addr::LOCALHOST, 19314)).unwrap();
    read_until_delivered(&mut engine);
    assert_eq!(engine.neighbors().len(), 1);

    std::thread::sleep(Duration::from_millis(80));
    engine.check_timeouts().unwrap();

    assert!(engine.neighbors().is_empty());
    assert_eq!(changed.get(), 2, "one fire for the new neighbor, one for its eviction");
}
