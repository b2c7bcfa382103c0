//! RangeLink firmware entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WifiAdapter      MulticastListener   HttpDeliveryClient       │
//! │  (Connectivity)   (Discovery)         (Delivery)               │
//! │  HC-SR04 / sim    StatusLed           LogEventSink             │
//! │  (RangeSensor)    (StatusLed)         (EventSink)              │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  ConnectingWifi → FindingServer → Running              │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::{Context, Result};
use embedded_hal::digital::OutputPin;
use log::{info, warn};

use rangelink::adapters::device_id;
use rangelink::adapters::discovery::MulticastListener;
use rangelink::adapters::http_client::HttpDeliveryClient;
use rangelink::adapters::log_sink::LogEventSink;
use rangelink::adapters::node::NodeAdapter;
use rangelink::adapters::time::MonotonicClock;
use rangelink::adapters::wifi::WifiAdapter;
use rangelink::app::ports::RangeSensorPort;
use rangelink::app::service::AppService;
use rangelink::config::SystemConfig;
use rangelink::drivers::status_led::StatusLed;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Bootstrap + logging ────────────────────────────────
    init_logging()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  RangeLink v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    config.validate().context("invalid configuration")?;
    info!(
        "Config: {:?} mode, discovery {}:{}, POST :{}{}",
        config.delivery_mode,
        config.discovery_group_addr(),
        config.discovery_port,
        config.server_port,
        config.data_path
    );

    // ── 3. Device identity ────────────────────────────────────
    let mac = device_id::read_mac();
    let chip_id = device_id::chip_id(&mac);
    let label = device_id::device_label(&mac);
    info!("Device: {} (chipId={})", label, chip_id);

    // ── 4. Adapters ───────────────────────────────────────────
    let clock = MonotonicClock::new();
    let mut node = build_node(&config, clock)?;

    let ssid = wifi_ssid(&config);
    match node.wifi_mut().set_credentials(ssid, &config.wifi_password) {
        Ok(()) => {
            if let Err(e) = node.wifi_mut().connect(clock.uptime_ms()) {
                warn!("WiFi: initial connect failed ({}), will retry", e);
            }
        }
        Err(e) => warn!("WiFi: {}; the node will stay in ConnectingWifi", e),
    }

    // ── 5. App service ────────────────────────────────────────
    let mut sink = LogEventSink::new(&label);
    let mut app = AppService::new(config.clone(), chip_id);
    app.start(clock.uptime_ms(), &mut node, &mut sink);

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    let period = Duration::from_millis(u64::from(config.control_loop_interval_ms));
    loop {
        let now_ms = clock.uptime_ms();
        node.wifi_mut().poll(now_ms);
        app.tick(now_ms, &mut node, &mut sink);
        std::thread::sleep(period);
    }
}

// ── Platform bring-up ─────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn init_logging() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn init_logging() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
        .context("logger already initialised")
}

#[cfg(target_os = "espidf")]
fn wifi_ssid(config: &SystemConfig) -> &str {
    &config.wifi_ssid
}

/// The host has no radio; any SSID satisfies the simulated link.
#[cfg(not(target_os = "espidf"))]
fn wifi_ssid(config: &SystemConfig) -> &str {
    if config.wifi_ssid.is_empty() {
        "host-network"
    } else {
        &config.wifi_ssid
    }
}

fn assemble<R, L>(config: &SystemConfig, wifi: WifiAdapter, sensor: R, led_pin: L) -> Result<NodeAdapter<R, L>>
where
    R: RangeSensorPort,
    L: OutputPin,
{
    let listener = MulticastListener::new(config.discovery_group_addr(), config.discovery_port);
    let http = HttpDeliveryClient::new(config.http_timeout_ms).context("HTTP client init")?;
    let led = StatusLed::new(led_pin, config.led_active_low);
    Ok(NodeAdapter::new(wifi, listener, http, sensor, led))
}

#[cfg(target_os = "espidf")]
fn build_node(
    config: &SystemConfig,
    clock: MonotonicClock,
) -> Result<NodeAdapter<impl RangeSensorPort, impl OutputPin>> {
    use esp_idf_hal::delay::Ets;
    use esp_idf_hal::gpio::{AnyIOPin, PinDriver};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::EspWifi;
    use rangelink::pins;
    use rangelink::sensors::ultrasonic::UltrasonicSensor;

    let peripherals = Peripherals::take().context("peripherals")?;
    let sysloop = EspSystemEventLoop::take().context("system event loop")?;
    let nvs = EspDefaultNvsPartition::take().context("NVS partition")?;
    let driver = EspWifi::new(peripherals.modem, sysloop, Some(nvs)).context("WiFi driver")?;

    // SAFETY: each GPIO number is claimed exactly once, here.
    let trig = PinDriver::output(unsafe { AnyIOPin::new(pins::ULTRASONIC_TRIG_GPIO) }).context("TRIG pin")?;
    let echo = PinDriver::input(unsafe { AnyIOPin::new(pins::ULTRASONIC_ECHO_GPIO) }).context("ECHO pin")?;
    let led = PinDriver::output(unsafe { AnyIOPin::new(pins::STATUS_LED_GPIO) }).context("LED pin")?;

    let sensor = UltrasonicSensor::new(
        trig,
        echo,
        Ets,
        clock,
        config.echo_timeout_us,
        config.max_range_cm,
    );
    assemble(config, WifiAdapter::new(driver), sensor, led)
}

#[cfg(not(target_os = "espidf"))]
fn build_node(
    config: &SystemConfig,
    _clock: MonotonicClock,
) -> Result<NodeAdapter<impl RangeSensorPort, impl OutputPin>> {
    use rangelink::drivers::sim_pin::SimPin;
    use rangelink::sensors::{SimRangeSensor, sim_set_distance_cm};

    match std::env::var("RANGELINK_SIM_CM") {
        Ok(v) => match v.trim().parse::<f32>() {
            Ok(cm) => {
                sim_set_distance_cm(cm);
                info!("Sim: ranger reports {:.2} cm", cm);
            }
            Err(_) => warn!("Sim: RANGELINK_SIM_CM='{}' is not a number, ranger reports no echo", v),
        },
        Err(_) => info!("Sim: RANGELINK_SIM_CM unset, ranger reports no echo"),
    }

    assemble(
        config,
        WifiAdapter::new(),
        SimRangeSensor::new(config.max_range_cm),
        SimPin::new("status-led"),
    )
}
