//! Integration tests for the AppService → FSM → ports pipeline.
//!
//! These run on the host (x86_64) against [`MockNode`] and drive the
//! service with an explicit millisecond clock.

use std::net::Ipv4Addr;

use super::mock_hw::{MockNode, RecordingSink};

use rangelink::app::events::AppEvent;
use rangelink::app::ports::DeliveryOutcome;
use rangelink::app::service::AppService;
use rangelink::config::{DeliveryMode, SystemConfig};
use rangelink::error::{CommsError, SensorError};
use rangelink::fsm::StateId;
use rangelink::sensors::RangeReading;

const SERVER: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 20);
const MARKER: &[u8] = b"ESP8266_SERVER_HERE";
const CHIP: u32 = 0x00EF_CAFE;
const TICK_MS: u64 = 10;

struct Rig {
    app: AppService<MockNode>,
    node: MockNode,
    sink: RecordingSink,
    now: u64,
}

impl Rig {
    fn new(config: SystemConfig) -> Self {
        let mut app = AppService::new(config, CHIP);
        let mut node = MockNode::new();
        let mut sink = RecordingSink::new();
        app.start(0, &mut node, &mut sink);
        Self { app, node, sink, now: 0 }
    }

    fn with_mode(mode: DeliveryMode) -> Self {
        let mut config = SystemConfig::default();
        config.delivery_mode = mode;
        Self::new(config)
    }

    fn tick(&mut self) {
        self.now += TICK_MS;
        self.app.tick(self.now, &mut self.node, &mut self.sink);
    }

    fn tick_at(&mut self, now: u64) {
        self.now = now;
        self.app.tick(self.now, &mut self.node, &mut self.sink);
    }

    /// Link up, beacon received, Running entered.
    fn to_running(&mut self) {
        self.node.connected = true;
        self.tick();
        assert_eq!(self.app.state(), StateId::FindingServer);
        self.node.queue_datagram(SERVER, MARKER);
        self.tick();
        assert_eq!(self.app.state(), StateId::Running);
    }
}

// ── End-to-end ────────────────────────────────────────────────

#[test]
fn boot_to_first_delivery() {
    let mut rig = Rig::with_mode(DeliveryMode::Trigger);
    assert_eq!(rig.app.state(), StateId::ConnectingWifi);
    assert_eq!(rig.sink.events[0], AppEvent::Started(StateId::ConnectingWifi));

    // Wi-Fi takes 30 ticks; LED flips every 100 ms meanwhile.
    for _ in 0..30 {
        rig.tick();
        let expected = (rig.now / 100) % 2 == 1;
        assert_eq!(rig.node.led(), expected, "LED at {} ms", rig.now);
        assert_eq!(rig.app.state(), StateId::ConnectingWifi);
    }
    assert!(rig.node.posts.is_empty());

    rig.node.connected = true;
    rig.tick();
    assert_eq!(rig.app.state(), StateId::FindingServer);
    assert!(!rig.node.led(), "slow blink restarts dark");

    rig.node.queue_datagram(SERVER, MARKER);
    rig.tick();
    assert_eq!(rig.app.state(), StateId::Running);
    assert!(rig.node.led(), "solid while running");
    assert_eq!(rig.app.endpoint().map(|e| e.ip), Some(SERVER));

    rig.node.readings.push_back(RangeReading::Valid(20.0));
    rig.tick();
    assert_eq!(rig.node.posts.len(), 1);
    let post = rig.node.last_post().unwrap();
    assert_eq!(post.url, "http://192.168.1.20:5000/data");
    assert!(post.body.contains(r#""distance":20.00"#), "{}", post.body);
    assert_eq!(post.json()["chipId"], CHIP);
    assert_eq!(rig.app.state(), StateId::Running);
    assert!(rig.node.led());

    let transitions: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            (StateId::ConnectingWifi, StateId::FindingServer),
            (StateId::FindingServer, StateId::Running),
        ]
    );
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::Delivered { counter: 1, status: 200 })), 1);
}

// ── Discovery ─────────────────────────────────────────────────

#[test]
fn near_miss_markers_do_not_complete_discovery() {
    let mut rig = Rig::with_mode(DeliveryMode::Trigger);
    rig.node.connected = true;
    rig.tick();

    let near_misses: [&[u8]; 5] = [
        b"ESP8266_SERVER_HER",
        b"ESP8266_SERVER_HERE\n",
        b"esp8266_server_here",
        b" ESP8266_SERVER_HERE",
        b"",
    ];
    for payload in near_misses {
        rig.node.queue_datagram(SERVER, payload);
        rig.tick();
        assert_eq!(rig.app.state(), StateId::FindingServer);
    }
    assert!(rig.app.endpoint().is_none());
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::DatagramIgnored { .. })), 5);
}

#[test]
fn first_matching_beacon_wins() {
    let mut rig = Rig::with_mode(DeliveryMode::Trigger);
    rig.node.connected = true;
    rig.tick();
    rig.node.queue_datagram(Ipv4Addr::new(10, 0, 0, 7), MARKER);
    rig.node.queue_datagram(SERVER, MARKER);
    rig.tick();
    assert_eq!(rig.app.endpoint().map(|e| e.ip), Some(Ipv4Addr::new(10, 0, 0, 7)));
    assert_eq!(rig.node.stop_calls, 1);
}

#[test]
fn discovery_waits_indefinitely() {
    let mut rig = Rig::with_mode(DeliveryMode::Trigger);
    rig.node.connected = true;
    for _ in 0..10_000 {
        rig.tick();
    }
    assert_eq!(rig.app.state(), StateId::FindingServer);
}

#[test]
fn bind_failure_is_retried_until_it_succeeds() {
    let mut rig = Rig::with_mode(DeliveryMode::Trigger);
    rig.node.connected = true;
    rig.node.bind_fails = true;
    rig.tick();
    rig.tick();
    rig.tick();
    assert_eq!(rig.node.begin_calls, 3);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::DiscoveryUnavailable), 1);

    rig.node.bind_fails = false;
    rig.tick();
    assert!(rig.node.armed);
    rig.node.queue_datagram(SERVER, MARKER);
    rig.tick();
    assert_eq!(rig.app.state(), StateId::Running);
    assert_eq!(rig.node.begin_calls, 4);
}

// ── Trigger mode ──────────────────────────────────────────────

#[test]
fn trigger_window_is_inclusive() {
    for (cm, fires) in [(5.0, true), (50.0, true), (4.99, false), (50.01, false)] {
        let mut rig = Rig::with_mode(DeliveryMode::Trigger);
        rig.to_running();
        rig.node.readings.push_back(RangeReading::Valid(cm));
        rig.tick();
        assert_eq!(rig.node.posts.len(), usize::from(fires), "{cm} cm");
    }
}

#[test]
fn invalid_readings_never_trigger() {
    let mut rig = Rig::with_mode(DeliveryMode::Trigger);
    rig.to_running();
    rig.node.default_reading = RangeReading::Invalid(SensorError::OutOfRange);
    for _ in 0..500 {
        rig.tick();
    }
    assert!(rig.node.posts.is_empty());
    assert!(rig.node.measure_calls > 0);
}

#[test]
fn debounce_suppresses_second_trigger() {
    let mut rig = Rig::with_mode(DeliveryMode::Trigger);
    rig.to_running();
    rig.node.default_reading = RangeReading::Valid(20.0);

    rig.tick_at(100);
    assert_eq!(rig.node.posts.len(), 1);

    rig.tick_at(600);
    assert_eq!(rig.node.posts.len(), 1);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::Debounced(_))), 1);

    rig.tick_at(1_100);
    assert_eq!(rig.node.posts.len(), 2);
    assert_eq!(rig.app.counter(), 2);
}

#[test]
fn trigger_samples_at_configured_interval() {
    let mut rig = Rig::with_mode(DeliveryMode::Trigger);
    rig.to_running();
    let start = rig.node.measure_calls;
    // 600 ms of 10 ms ticks at a 60 ms sample interval
    for _ in 0..60 {
        rig.tick();
    }
    assert_eq!(rig.node.measure_calls - start, 10);
}

#[test]
fn trigger_body_omits_message() {
    let mut rig = Rig::with_mode(DeliveryMode::Trigger);
    rig.to_running();
    rig.node.readings.push_back(RangeReading::Valid(33.333));
    rig.tick();
    let json = rig.node.last_post().unwrap().json();
    assert!(json.get("message").is_none());
    assert_eq!(json["counter"], 1);
    assert!(rig.node.last_post().unwrap().body.contains(r#""distance":33.33"#));
}

// ── Periodic mode ─────────────────────────────────────────────

#[test]
fn periodic_posts_every_interval_with_message() {
    let mut rig = Rig::with_mode(DeliveryMode::Periodic);
    rig.to_running();

    rig.tick_at(1_000);
    rig.tick_at(3_000);
    rig.tick_at(5_999);
    assert_eq!(rig.node.posts.len(), 1);
    rig.tick_at(6_000);
    assert_eq!(rig.node.posts.len(), 2);

    let json = rig.node.last_post().unwrap().json();
    assert_eq!(json["message"], "Hello from RangeLink");
    assert_eq!(json["counter"], 2);
    assert_eq!(json["chipId"], CHIP);
}

#[test]
fn periodic_sends_invalid_reading_as_zero() {
    let mut rig = Rig::with_mode(DeliveryMode::Periodic);
    rig.to_running();
    rig.tick();
    let body = &rig.node.last_post().unwrap().body;
    assert!(body.contains(r#""distance":0.00"#), "{body}");
}

// ── Failure handling ──────────────────────────────────────────

#[test]
fn error_statuses_keep_the_session() {
    let mut rig = Rig::with_mode(DeliveryMode::Periodic);
    rig.to_running();
    rig.node.responses.push_back(DeliveryOutcome::Responded(404));
    rig.node.responses.push_back(DeliveryOutcome::Responded(500));

    rig.tick_at(1_000);
    rig.tick_at(7_000);
    assert_eq!(rig.node.posts.len(), 2);
    assert_eq!(rig.app.state(), StateId::Running);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::Delivered { .. })), 2);
}

#[test]
fn failed_post_returns_to_discovery_in_same_tick() {
    let mut rig = Rig::with_mode(DeliveryMode::Trigger);
    rig.to_running();
    rig.node.responses.push_back(DeliveryOutcome::Failed(CommsError::HttpConnectFailed));
    rig.node.readings.push_back(RangeReading::Valid(20.0));

    rig.tick();
    assert_eq!(rig.node.posts.len(), 1);
    assert_eq!(rig.app.state(), StateId::FindingServer);
    assert!(rig.app.endpoint().is_none());
    assert_eq!(rig.node.begin_calls, 2, "listener re-armed on entry");
    assert!(!rig.node.led(), "slow blink restarts dark");
    assert!(rig.sink.events.contains(&AppEvent::StateChanged {
        from: StateId::Running,
        to: StateId::FindingServer,
    }));
}

#[test]
fn rediscovery_resumes_delivery_and_counter() {
    let mut rig = Rig::with_mode(DeliveryMode::Trigger);
    rig.to_running();
    rig.node.default_reading = RangeReading::Valid(20.0);
    rig.node.responses.push_back(DeliveryOutcome::Failed(CommsError::HttpTimeout));
    rig.tick();
    assert_eq!(rig.app.state(), StateId::FindingServer);

    let other = Ipv4Addr::new(192, 168, 1, 21);
    rig.node.queue_datagram(other, MARKER);
    rig.tick();
    assert_eq!(rig.app.state(), StateId::Running);
    rig.tick();
    assert_eq!(rig.node.posts.len(), 2);
    assert_eq!(rig.node.last_post().unwrap().url, "http://192.168.1.21:5000/data");
    assert_eq!(rig.app.counter(), 2);
}

#[test]
fn wifi_loss_at_send_returns_to_connecting() {
    let mut rig = Rig::with_mode(DeliveryMode::Trigger);
    rig.to_running();
    rig.node.connected = false;
    rig.node.readings.push_back(RangeReading::Valid(20.0));

    rig.tick();
    assert_eq!(rig.app.state(), StateId::ConnectingWifi);
    assert!(rig.node.posts.is_empty());
    assert!(rig.app.endpoint().is_none());
    assert_eq!(rig.sink.count(|e| *e == AppEvent::LinkLost), 1);
}

#[test]
fn no_send_while_connecting() {
    let mut rig = Rig::with_mode(DeliveryMode::Periodic);
    rig.node.default_reading = RangeReading::Valid(20.0);
    for _ in 0..2_000 {
        rig.tick();
    }
    assert_eq!(rig.app.state(), StateId::ConnectingWifi);
    assert!(rig.node.posts.is_empty());
    assert_eq!(rig.node.measure_calls, 0);
    assert_eq!(rig.node.begin_calls, 0);
}
