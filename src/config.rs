//! System configuration parameters
//!
//! All tunable parameters for the RangeLink node.  Wi-Fi credentials are
//! baked in at build time (see `build.rs`); everything else defaults to the
//! values the collector server expects.

use serde::{Deserialize, Serialize};

/// Which delivery policy the node runs once a server is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMode {
    /// Measure and POST unconditionally every `post_interval_ms`.
    Periodic,
    /// Measure continuously; POST only when the reading falls inside the
    /// trigger window and the debounce interval has elapsed.
    Trigger,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- WiFi ---
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,

    // --- Discovery ---
    /// IPv4 multicast group the collector announces itself on.
    pub discovery_group: [u8; 4],
    /// UDP port of the discovery beacon.
    pub discovery_port: u16,
    /// Exact datagram payload that identifies the collector.
    pub discovery_marker: heapless::String<32>,

    // --- Delivery ---
    /// TCP port of the collector's HTTP endpoint.
    pub server_port: u16,
    /// Path readings are POSTed to.
    pub data_path: heapless::String<32>,
    /// Transport timeout for one POST (connect + response).
    pub http_timeout_ms: u32,
    pub delivery_mode: DeliveryMode,
    /// Free-text greeting included in periodic-mode payloads.
    pub message: heapless::String<48>,

    // --- Periodic mode ---
    pub post_interval_ms: u32,

    // --- Trigger mode ---
    /// Minimum spacing between two echo measurements.
    pub sample_interval_ms: u32,
    /// Inclusive lower bound of the trigger window (cm).
    pub trigger_min_cm: f32,
    /// Inclusive upper bound of the trigger window (cm).
    pub trigger_max_cm: f32,
    /// Minimum spacing between two trigger deliveries.
    pub trigger_debounce_ms: u32,

    // --- Range sensor ---
    /// Upper bound on each echo wait (µs).
    pub echo_timeout_us: u32,
    /// Readings beyond this are treated as sensor faults (cm).
    pub max_range_cm: f32,

    // --- Status LED ---
    /// Toggle period while joining Wi-Fi.
    pub led_connecting_toggle_ms: u32,
    /// Toggle period while waiting for the discovery beacon.
    pub led_discovering_toggle_ms: u32,
    /// The reference board's built-in LED lights when the pin is LOW.
    pub led_active_low: bool,

    // --- Timing ---
    /// Main loop pacing (milliseconds between ticks).
    pub control_loop_interval_ms: u32,
}

fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    // Over-long values are left empty and caught by `validate`.
    let _ = out.push_str(s);
    out
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // WiFi
            wifi_ssid: bounded(env!("WIFI_SSID")),
            wifi_password: bounded(env!("WIFI_PASSWORD")),

            // Discovery
            discovery_group: [224, 1, 1, 1],
            discovery_port: 5007,
            discovery_marker: bounded("ESP8266_SERVER_HERE"),

            // Delivery
            server_port: 5000,
            data_path: bounded("/data"),
            http_timeout_ms: 5000,
            delivery_mode: DeliveryMode::Trigger,
            message: bounded("Hello from RangeLink"),

            // Periodic mode
            post_interval_ms: 5000,

            // Trigger mode
            sample_interval_ms: 60, // HC-SR04 minimum ping spacing
            trigger_min_cm: 5.0,
            trigger_max_cm: 50.0,
            trigger_debounce_ms: 1000,

            // Range sensor
            echo_timeout_us: 30_000, // ~5 m round trip
            max_range_cm: 400.0,

            // Status LED
            led_connecting_toggle_ms: 100,
            led_discovering_toggle_ms: 1000,
            led_active_low: true,

            // Timing
            control_loop_interval_ms: 10,
        }
    }
}

/// Reason a [`SystemConfig`] was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl SystemConfig {
    /// Multicast group as an address.
    pub fn discovery_group_addr(&self) -> std::net::Ipv4Addr {
        std::net::Ipv4Addr::from(self.discovery_group)
    }

    /// Reject values the state machine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.discovery_group_addr().is_multicast() {
            return Err(ConfigError::ValidationFailed(
                "discovery_group must be an IPv4 multicast address",
            ));
        }
        if self.discovery_port == 0 || self.server_port == 0 {
            return Err(ConfigError::ValidationFailed("ports must be non-zero"));
        }
        if self.discovery_marker.is_empty() {
            return Err(ConfigError::ValidationFailed("discovery_marker is empty"));
        }
        if !self.data_path.starts_with('/') {
            return Err(ConfigError::ValidationFailed("data_path must start with '/'"));
        }
        if self.post_interval_ms == 0
            || self.led_connecting_toggle_ms == 0
            || self.led_discovering_toggle_ms == 0
            || self.http_timeout_ms == 0
        {
            return Err(ConfigError::ValidationFailed("periods must be non-zero"));
        }
        if !(self.trigger_min_cm > 0.0 && self.trigger_min_cm <= self.trigger_max_cm) {
            return Err(ConfigError::ValidationFailed(
                "trigger window must satisfy 0 < min <= max",
            ));
        }
        if self.trigger_max_cm > self.max_range_cm {
            return Err(ConfigError::ValidationFailed(
                "trigger_max_cm exceeds the sensor's max_range_cm",
            ));
        }
        if self.echo_timeout_us == 0 {
            return Err(ConfigError::ValidationFailed("echo_timeout_us must be non-zero"));
        }
        Ok(())
    }
}
