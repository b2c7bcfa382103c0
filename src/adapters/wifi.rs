//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the hexagonal boundary for network
//! connectivity.  The state machine only ever asks "is the link up?";
//! association and reconnection are driven from the main loop through
//! [`WifiAdapter::poll`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: the host's network is assumed; the link can be
//!   dropped and made unreachable from tests.
//!
//! ## Reconnection policy
//!
//! On disconnect, or an association attempt that does not come up within
//! `CONNECT_TIMEOUT_MS`, the adapter starts over from scratch after a fixed
//! `RETRY_INTERVAL_MS`.  The delay never grows, so the link is back within
//! one interval of the AP returning.

use core::fmt;
use log::{info, warn};

use crate::app::ports::ConnectivityPort;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
}

/// Pause between a failed or lost association and the next attempt.
pub const RETRY_INTERVAL_MS: u64 = 2_000;
/// An association that is not up after this long counts as failed.
pub const CONNECT_TIMEOUT_MS: u64 = 15_000;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    attempt: u32,
    next_retry_ms: u64,
    connect_started_ms: u64,
    last_rssi: Option<i8>,
    #[cfg(target_os = "espidf")]
    driver: EspWifi<'static>,
    /// Simulation: whether the host "AP" is in range.
    #[cfg(not(target_os = "espidf"))]
    sim_reachable: bool,
    /// Simulation: an association request is active.
    #[cfg(not(target_os = "espidf"))]
    sim_link: bool,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(driver: EspWifi<'static>) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            attempt: 0,
            next_retry_ms: 0,
            connect_started_ms: 0,
            last_rssi: None,
            driver,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            attempt: 0,
            next_retry_ms: 0,
            connect_started_ms: 0,
            last_rssi: None,
            sim_reachable: true,
            sim_link: false,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    /// Start associating.  Returns once the request is issued; the link
    /// comes up asynchronously and is picked up by [`poll`](Self::poll).
    pub fn connect(&mut self, now_ms: u64) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        match self.platform_connect() {
            Ok(()) => {
                self.state = WifiState::Connecting;
                self.connect_started_ms = now_ms;
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: connection failed: {}", e);
                self.schedule_retry(now_ms);
                Err(e)
            }
        }
    }

    pub fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        self.last_rssi = None;
        info!("WiFi: disconnected");
    }

    /// Drive association, loss detection and retries.  Call every loop
    /// iteration.
    pub fn poll(&mut self, now_ms: u64) {
        match self.state {
            WifiState::Connecting => {
                if self.platform_is_connected() {
                    self.state = WifiState::Connected;
                    self.attempt = 0;
                    self.last_rssi = self.platform_rssi();
                    info!("WiFi: connected (RSSI={:?})", self.last_rssi);
                } else if now_ms.saturating_sub(self.connect_started_ms) >= CONNECT_TIMEOUT_MS {
                    warn!("WiFi: association timed out");
                    self.platform_disconnect();
                    self.schedule_retry(now_ms);
                }
            }
            WifiState::Connected => {
                if self.platform_is_connected() {
                    self.last_rssi = self.platform_rssi();
                } else {
                    warn!("WiFi: connection lost, entering reconnect");
                    self.last_rssi = None;
                    self.schedule_retry(now_ms);
                }
            }
            WifiState::Reconnecting { attempt } => {
                if now_ms < self.next_retry_ms {
                    return;
                }
                info!("WiFi: reconnect attempt {}", attempt);
                match self.platform_connect() {
                    Ok(()) => {
                        self.state = WifiState::Connecting;
                        self.connect_started_ms = now_ms;
                    }
                    Err(e) => {
                        warn!("WiFi: reconnect failed: {}", e);
                        self.schedule_retry(now_ms);
                    }
                }
            }
            WifiState::Disconnected => {}
        }
    }

    fn schedule_retry(&mut self, now_ms: u64) {
        self.attempt += 1;
        self.next_retry_ms = now_ms + RETRY_INTERVAL_MS;
        info!("WiFi: retry {} in {} ms", self.attempt, RETRY_INTERVAL_MS);
        self.state = WifiState::Reconnecting { attempt: self.attempt };
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let cfg = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        self.driver.set_configuration(&cfg).map_err(|e| {
            warn!("WiFi(espidf): set_configuration: {}", e);
            ConnectivityError::ConnectionFailed
        })?;
        if !self.driver.is_started().unwrap_or(false) {
            self.driver.start().map_err(|e| {
                warn!("WiFi(espidf): start: {}", e);
                ConnectivityError::ConnectionFailed
            })?;
        }
        self.driver.connect().map_err(|e| {
            warn!("WiFi(espidf): connect: {}", e);
            ConnectivityError::ConnectionFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        self.sim_link = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.driver.disconnect() {
            warn!("WiFi(espidf): disconnect: {}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_link = false;
    }

    /// Associated and the station interface has an address.
    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver.is_connected().unwrap_or(false) && self.driver.sta_netif().is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_link && self.sim_reachable
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        use esp_idf_svc::sys::{ESP_OK, esp_wifi_sta_get_ap_info, wifi_ap_record_t};
        let mut ap_info: wifi_ap_record_t = unsafe { core::mem::zeroed() };
        let err = unsafe { esp_wifi_sta_get_ap_info(&mut ap_info) };
        (err == ESP_OK as i32).then_some(ap_info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        self.platform_is_connected().then_some(-60)
    }

    // ── Simulation hooks ──────────────────────────────────────

    /// Simulate the AP going away; the next `poll` notices.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&mut self) {
        self.sim_link = false;
    }

    /// Whether the AP is in range.  An active association request links
    /// up as soon as it is.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_reachable(&mut self, reachable: bool) {
        self.sim_reachable = reachable;
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_is_connected()
    }

    fn rssi(&self) -> Option<i8> {
        self.last_rssi
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
