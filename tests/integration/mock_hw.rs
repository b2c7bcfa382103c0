//! Mock node adapter for integration tests.
//!
//! Implements every port the state machine touches and records each call
//! so tests can assert on the full history without sockets or GPIO.

use std::collections::VecDeque;
use std::net::Ipv4Addr;

use rangelink::app::events::AppEvent;
use rangelink::app::ports::{
    ConnectivityPort, Datagram, DeliveryOutcome, DeliveryPort, DiscoveryPort, EventSink,
    RangeSensorPort, StatusLedPort,
};
use rangelink::error::{CommsError, SensorError};
use rangelink::sensors::RangeReading;

// ── Recorded POST ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub url: String,
    pub body: String,
}

impl Post {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("body is JSON")
    }
}

// ── MockNode ──────────────────────────────────────────────────

pub struct MockNode {
    pub connected: bool,
    pub bind_fails: bool,
    pub armed: bool,
    pub begin_calls: u32,
    pub stop_calls: u32,
    pub datagrams: VecDeque<Datagram>,
    /// Returned in order; once empty, `default_reading` is repeated.
    pub readings: VecDeque<RangeReading>,
    pub default_reading: RangeReading,
    pub measure_calls: u32,
    /// Returned in order; once empty, `default_response` is repeated.
    pub responses: VecDeque<DeliveryOutcome>,
    pub default_response: DeliveryOutcome,
    pub posts: Vec<Post>,
    pub led_levels: Vec<bool>,
}

#[allow(dead_code)]
impl MockNode {
    pub fn new() -> Self {
        Self {
            connected: false,
            bind_fails: false,
            armed: false,
            begin_calls: 0,
            stop_calls: 0,
            datagrams: VecDeque::new(),
            readings: VecDeque::new(),
            default_reading: RangeReading::Invalid(SensorError::EchoTimeout),
            measure_calls: 0,
            responses: VecDeque::new(),
            default_response: DeliveryOutcome::Responded(200),
            posts: Vec::new(),
            led_levels: Vec::new(),
        }
    }

    pub fn queue_datagram(&mut self, source: Ipv4Addr, payload: &[u8]) {
        self.datagrams.push_back(Datagram::new(source, payload));
    }

    pub fn led(&self) -> bool {
        self.led_levels.last().copied().unwrap_or(false)
    }

    pub fn last_post(&self) -> Option<&Post> {
        self.posts.last()
    }
}

impl Default for MockNode {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityPort for MockNode {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn rssi(&self) -> Option<i8> {
        self.connected.then_some(-50)
    }
}

impl DiscoveryPort for MockNode {
    fn begin_discovery(&mut self) -> Result<(), CommsError> {
        self.begin_calls += 1;
        if self.bind_fails {
            return Err(CommsError::DiscoveryBindFailed);
        }
        self.armed = true;
        Ok(())
    }

    fn poll_discovery(&mut self) -> Option<Datagram> {
        if !self.armed {
            return None;
        }
        self.datagrams.pop_front()
    }

    fn stop_discovery(&mut self) {
        self.stop_calls += 1;
        self.armed = false;
    }
}

impl DeliveryPort for MockNode {
    fn post_json(&mut self, url: &str, body: &str) -> DeliveryOutcome {
        self.posts.push(Post {
            url: url.to_string(),
            body: body.to_string(),
        });
        self.responses.pop_front().unwrap_or(self.default_response)
    }
}

impl RangeSensorPort for MockNode {
    fn measure(&mut self) -> RangeReading {
        self.measure_calls += 1;
        self.readings.pop_front().unwrap_or(self.default_reading)
    }
}

impl StatusLedPort for MockNode {
    fn set_led(&mut self, on: bool) {
        self.led_levels.push(on);
    }
}

// ── Recording event sink ──────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
