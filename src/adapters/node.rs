//! Node adapter: bridges the concrete adapters to the domain port traits.
//!
//! Owns the Wi-Fi link, the discovery listener, the HTTP client, the range
//! sensor and the status LED, and exposes them through the five ports the
//! state machine needs ([`NodePorts`](crate::app::ports::NodePorts)).
//! This is the only place the domain meets real sockets and pins.

use embedded_hal::digital::OutputPin;

use super::discovery::MulticastListener;
use super::http_client::HttpDeliveryClient;
use super::wifi::WifiAdapter;
use crate::app::ports::{
    ConnectivityPort, Datagram, DeliveryOutcome, DeliveryPort, DiscoveryPort, RangeSensorPort,
    StatusLedPort,
};
use crate::drivers::status_led::StatusLed;
use crate::error::CommsError;
use crate::sensors::RangeReading;

pub struct NodeAdapter<R, L> {
    wifi: WifiAdapter,
    listener: MulticastListener,
    http: HttpDeliveryClient,
    sensor: R,
    led: StatusLed<L>,
}

impl<R, L> NodeAdapter<R, L>
where
    R: RangeSensorPort,
    L: OutputPin,
{
    pub fn new(
        wifi: WifiAdapter,
        listener: MulticastListener,
        http: HttpDeliveryClient,
        sensor: R,
        led: StatusLed<L>,
    ) -> Self {
        Self {
            wifi,
            listener,
            http,
            sensor,
            led,
        }
    }

    /// The main loop drives association and retries through this.
    pub fn wifi_mut(&mut self) -> &mut WifiAdapter {
        &mut self.wifi
    }

    pub fn led_is_on(&self) -> bool {
        self.led.is_on()
    }
}

// ── ConnectivityPort ──────────────────────────────────────────

impl<R, L> ConnectivityPort for NodeAdapter<R, L> {
    fn is_connected(&self) -> bool {
        self.wifi.is_connected()
    }

    fn rssi(&self) -> Option<i8> {
        self.wifi.rssi()
    }
}

// ── DiscoveryPort ─────────────────────────────────────────────

impl<R, L> DiscoveryPort for NodeAdapter<R, L> {
    fn begin_discovery(&mut self) -> Result<(), CommsError> {
        self.listener.start()
    }

    fn poll_discovery(&mut self) -> Option<Datagram> {
        self.listener.poll()
    }

    fn stop_discovery(&mut self) {
        self.listener.stop();
    }
}

// ── DeliveryPort ──────────────────────────────────────────────

impl<R, L> DeliveryPort for NodeAdapter<R, L> {
    fn post_json(&mut self, url: &str, body: &str) -> DeliveryOutcome {
        self.http.post_json(url, body)
    }
}

// ── Sensor / LED ──────────────────────────────────────────────

impl<R: RangeSensorPort, L> RangeSensorPort for NodeAdapter<R, L> {
    fn measure(&mut self) -> RangeReading {
        self.sensor.measure()
    }
}

impl<R, L: OutputPin> StatusLedPort for NodeAdapter<R, L> {
    fn set_led(&mut self, on: bool) {
        self.led.set(on);
    }
}
