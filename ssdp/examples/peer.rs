//! A reference host loop for `Engine`, modeled on the original
//! `lssdp` project's own `test/daemon.c`: poll the receive socket
//! with a short timeout, and once every five seconds refresh
//! interfaces, send `M-SEARCH`/`NOTIFY`, and check neighbor timeouts.
//!
//! ```text
//! cargo run --example peer -- --st ST_P2P --usn my-device
//! ```

use clap::Parser;
use lssdp_netif::log::StderrLog;
use lssdp_ssdp::{Config, Engine};
use mio::{Events, Interest, Poll, Token};
use std::time::{Duration, Instant};

#[derive(Parser)]
struct Args {
    #[arg(long, default_value_t = 1900)]
    port: u16,

    #[arg(long, default_value = "ST_P2P")]
    st: String,

    #[arg(long, default_value = "lssdp-rs-peer")]
    usn: String,
}

const RECEIVE_TOKEN: Token = Token(0);
const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

fn show_interfaces(engine: &Engine<StderrLog>) {
    println!("\nNetwork Interface List ({}):", engine.interfaces().len());
    for (i, iface) in engine.interfaces().iter().enumerate() {
        println!("{}. {:<6}: {}", i + 1, iface.name, iface.ip);
    }
}

fn show_neighbors(engine: &Engine<StderrLog>) {
    println!("\nSSDP List:");
    for (i, nbr) in engine.neighbors().iter().enumerate() {
        println!(
            "{}. id = {:<9}, ip = {:<20}, name = {:<12}, device_type = {} ({})",
            i + 1,
            nbr.sm_id,
            nbr.location,
            nbr.usn,
            nbr.device_type,
            nbr.update_time_ms
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = Config::new(args.st, args.usn)
        .with_port(args.port)
        .with_device_type("node");

    let mut engine = Engine::new(config, Some(StderrLog));

    engine.refresh_interfaces()?;
    engine.socket_create()?;

    let mut poll = Poll::new()?;
    let raw_fd = engine
        .receive_fd()
        .expect("socket_create just succeeded, so a descriptor exists");
    let mut source = mio::unix::SourceFd(&raw_fd);
    poll.registry()
        .register(&mut source, RECEIVE_TOKEN, Interest::READABLE)?;

    let mut events = Events::with_capacity(8);
    let mut last_refresh = Instant::now();

    loop {
        poll.poll(&mut events, Some(Duration::from_millis(500)))?;

        for event in &events {
            if event.token() == RECEIVE_TOKEN {
                engine.read()?;
            }
        }

        if last_refresh.elapsed() >= REFRESH_INTERVAL {
            if engine.refresh_interfaces()? {
                show_interfaces(&engine);
                engine.socket_create()?;
                // A long-running host should re-register the new
                // descriptor with `poll` here; this example rebinds
                // to the same port, so the fd is usually unchanged.
            }
            engine.send_msearch()?;
            engine.send_notify()?;
            let before = engine.neighbors().len();
            engine.check_timeouts()?;
            if engine.neighbors().len() != before {
                show_neighbors(&engine);
            }
            last_refresh = Instant::now();
        }
    }
}
