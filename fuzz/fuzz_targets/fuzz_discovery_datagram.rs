//! Fuzz target: discovery datagram handling
//!
//! Arbitrary bytes are wrapped as a received datagram and checked against
//! the beacon marker.
//!
//! Invariants checked:
//! - No panics for any length, including past the receive buffer
//! - The stored payload never exceeds `DISCOVERY_BUFFER_LEN`
//! - Only the exact marker bytes match
//!
//! cargo fuzz run fuzz_discovery_datagram

#![no_main]

use std::net::Ipv4Addr;

use libfuzzer_sys::fuzz_target;
use rangelink::app::ports::{DISCOVERY_BUFFER_LEN, Datagram};

const MARKER: &str = "ESP8266_SERVER_HERE";

fuzz_target!(|data: &[u8]| {
    let d = Datagram::new(Ipv4Addr::new(192, 168, 4, 1), data);
    assert!(d.payload.len() <= DISCOVERY_BUFFER_LEN);
    assert_eq!(d.matches_marker(MARKER), data == MARKER.as_bytes());
});
