//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (Wi-Fi, discovery socket, HTTP client, ranger, LED,
//! event sinks) implement these traits.  The state machine consumes them
//! via generics, so the domain core never touches hardware or sockets
//! directly.

use core::fmt;
use std::net::Ipv4Addr;

use crate::error::CommsError;
use crate::sensors::RangeReading;

/// Discovery datagrams are read into a buffer of this size; anything longer
/// is truncated by the socket and can no longer match the marker.
pub const DISCOVERY_BUFFER_LEN: usize = 64;

// ───────────────────────────────────────────────────────────────
// Value types crossing the boundary
// ───────────────────────────────────────────────────────────────

/// The collector's HTTP endpoint, learned from a discovery beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl ServerEndpoint {
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }

    /// `http://<ip>:<port><path>`
    pub fn url(&self, path: &str) -> String {
        format!("http://{}:{}{}", self.ip, self.port, path)
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// One received discovery datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub source: Ipv4Addr,
    pub payload: heapless::Vec<u8, DISCOVERY_BUFFER_LEN>,
}

impl Datagram {
    /// Build from raw bytes; bytes past the buffer length are dropped.
    pub fn new(source: Ipv4Addr, bytes: &[u8]) -> Self {
        let n = bytes.len().min(DISCOVERY_BUFFER_LEN);
        let payload = heapless::Vec::from_slice(&bytes[..n]).unwrap_or_default();
        Self { source, payload }
    }

    /// Byte-for-byte equality with the marker; no prefix or trailing slack.
    pub fn matches_marker(&self, marker: &str) -> bool {
        self.payload.as_slice() == marker.as_bytes()
    }
}

/// What the transport reported for one POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The server answered with this HTTP status.
    Responded(u16),
    /// No response: connect failure, timeout or broken transfer.
    Failed(CommsError),
}

impl DeliveryOutcome {
    /// The session survives any positive status, 4xx and 5xx included.
    pub fn keeps_session(&self) -> bool {
        matches!(self, Self::Responded(status) if *status > 0)
    }

    pub fn is_success_status(&self) -> bool {
        matches!(self, Self::Responded(status) if (200..300).contains(status))
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Responded(status) => write!(f, "HTTP {}", status),
            Self::Failed(e) => write!(f, "{}", e),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (driven adapter: Wi-Fi link → domain)
// ───────────────────────────────────────────────────────────────

/// Link status as seen by the state machine.
pub trait ConnectivityPort {
    fn is_connected(&self) -> bool;

    /// Signal strength in dBm while associated.
    fn rssi(&self) -> Option<i8>;
}

// ───────────────────────────────────────────────────────────────
// Discovery port (driven adapter: multicast socket → domain)
// ───────────────────────────────────────────────────────────────

/// Listener for the collector's multicast beacon.
pub trait DiscoveryPort {
    /// Bind and join the multicast group.  Idempotent.
    fn begin_discovery(&mut self) -> Result<(), CommsError>;

    /// Non-blocking: at most one datagram per call.
    fn poll_discovery(&mut self) -> Option<Datagram>;

    /// Leave the group and release the socket.  Idempotent.
    fn stop_discovery(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Delivery port (driven adapter: domain → HTTP)
// ───────────────────────────────────────────────────────────────

/// Synchronous JSON POST.
pub trait DeliveryPort {
    /// POST `body` with `Content-Type: application/json`.  Blocks for at
    /// most the transport's own timeout.
    fn post_json(&mut self, url: &str, body: &str) -> DeliveryOutcome;
}

// ───────────────────────────────────────────────────────────────
// Sensor / actuator ports
// ───────────────────────────────────────────────────────────────

/// One fresh distance measurement per call.
pub trait RangeSensorPort {
    fn measure(&mut self) -> RangeReading;
}

/// Single on/off status LED.
pub trait StatusLedPort {
    fn set_led(&mut self, on: bool);
}

/// Everything the node state machine touches during a tick.
pub trait NodePorts:
    ConnectivityPort + DiscoveryPort + DeliveryPort + RangeSensorPort + StatusLedPort
{
}

impl<T> NodePorts for T where
    T: ConnectivityPort + DiscoveryPort + DeliveryPort + RangeSensorPort + StatusLedPort
{
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, test
/// recorder, ...).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
