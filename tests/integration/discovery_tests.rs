//! Loopback tests for the multicast discovery listener and beacon.
//!
//! The beacon is pointed at 127.0.0.1 so no multicast routing is needed;
//! the listener does not care how a datagram reached its port.

use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::thread;
use std::time::Duration;

use rangelink::adapters::discovery::{DiscoveryBeacon, MulticastListener};
use rangelink::app::ports::{DISCOVERY_BUFFER_LEN, Datagram, DiscoveryPort};

const GROUP: Ipv4Addr = Ipv4Addr::new(224, 1, 1, 1);
const MARKER: &str = "ESP8266_SERVER_HERE";

fn armed_listener() -> (MulticastListener, u16) {
    let mut listener = MulticastListener::new(GROUP, 0);
    listener.begin_discovery().expect("bind ephemeral port");
    let port = listener.local_port().expect("bound");
    (listener, port)
}

fn wait_for(listener: &mut MulticastListener) -> Option<Datagram> {
    for _ in 0..200 {
        if let Some(d) = listener.poll_discovery() {
            return Some(d);
        }
        thread::sleep(Duration::from_millis(5));
    }
    None
}

#[test]
fn beacon_marker_is_received_with_sender_address() {
    let (mut listener, port) = armed_listener();
    let beacon = DiscoveryBeacon::new(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)).unwrap();
    assert_eq!(beacon.announce(MARKER).unwrap(), MARKER.len());

    let d = wait_for(&mut listener).expect("datagram");
    assert_eq!(d.source, Ipv4Addr::LOCALHOST);
    assert!(d.matches_marker(MARKER));
}

#[test]
fn one_datagram_per_poll() {
    let (mut listener, port) = armed_listener();
    let beacon = DiscoveryBeacon::new(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)).unwrap();
    beacon.announce("first").unwrap();
    beacon.announce(MARKER).unwrap();

    let first = wait_for(&mut listener).unwrap();
    assert!(!first.matches_marker(MARKER));
    let second = wait_for(&mut listener).unwrap();
    assert!(second.matches_marker(MARKER));
}

#[test]
fn oversized_datagram_is_truncated_and_never_matches() {
    let (mut listener, port) = armed_listener();
    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    let mut big = MARKER.as_bytes().to_vec();
    big.resize(200, b'X');
    sender.send_to(&big, ("127.0.0.1", port)).unwrap();

    let d = wait_for(&mut listener).unwrap();
    assert_eq!(d.payload.len(), DISCOVERY_BUFFER_LEN);
    assert!(!d.matches_marker(MARKER));
}

#[test]
fn stopped_listener_releases_port() {
    let (mut listener, port) = armed_listener();
    listener.stop_discovery();
    assert!(listener.poll_discovery().is_none());
    // The port can be bound again once released.
    let again = UdpSocket::bind(("0.0.0.0", port));
    assert!(again.is_ok());
}
