//! Fuzz target: `AppService` driven by arbitrary link, beacon, sensor and
//! HTTP behaviour
//!
//! The first byte picks the delivery mode; every following byte is one
//! 10 ms tick whose bits set the link, a waiting beacon (real or garbage),
//! the reading and the collector's answer.
//!
//! Invariants checked:
//! - No panics
//! - A POST is only issued while the link is up
//! - `Running` always has an endpoint and a lit LED
//! - The counter equals the number of POST attempts
//!
//! cargo fuzz run fuzz_node_session

#![no_main]

use std::net::Ipv4Addr;

use libfuzzer_sys::fuzz_target;
use rangelink::app::events::AppEvent;
use rangelink::app::ports::{
    ConnectivityPort, Datagram, DeliveryOutcome, DeliveryPort, DiscoveryPort, EventSink,
    RangeSensorPort, StatusLedPort,
};
use rangelink::app::service::AppService;
use rangelink::config::{DeliveryMode, SystemConfig};
use rangelink::error::{CommsError, SensorError};
use rangelink::fsm::StateId;
use rangelink::sensors::RangeReading;

struct FuzzNode {
    link: bool,
    armed: bool,
    pending: Option<Datagram>,
    reading: RangeReading,
    answer: DeliveryOutcome,
    posts: u32,
    offline_posts: u32,
    led: bool,
}

impl ConnectivityPort for FuzzNode {
    fn is_connected(&self) -> bool {
        self.link
    }
    fn rssi(&self) -> Option<i8> {
        None
    }
}

impl DiscoveryPort for FuzzNode {
    fn begin_discovery(&mut self) -> Result<(), CommsError> {
        self.armed = true;
        Ok(())
    }
    fn poll_discovery(&mut self) -> Option<Datagram> {
        if self.armed { self.pending.take() } else { None }
    }
    fn stop_discovery(&mut self) {
        self.armed = false;
    }
}

impl DeliveryPort for FuzzNode {
    fn post_json(&mut self, _url: &str, _body: &str) -> DeliveryOutcome {
        self.posts += 1;
        if !self.link {
            self.offline_posts += 1;
        }
        self.answer
    }
}

impl RangeSensorPort for FuzzNode {
    fn measure(&mut self) -> RangeReading {
        self.reading
    }
}

impl StatusLedPort for FuzzNode {
    fn set_led(&mut self, on: bool) {
        self.led = on;
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Some((&mode, ticks)) = data.split_first() else {
        return;
    };
    let config = SystemConfig {
        delivery_mode: if mode & 1 == 0 {
            DeliveryMode::Trigger
        } else {
            DeliveryMode::Periodic
        },
        post_interval_ms: 50,
        trigger_debounce_ms: 100,
        ..SystemConfig::default()
    };
    let marker = config.discovery_marker.clone();

    let mut io = FuzzNode {
        link: false,
        armed: false,
        pending: None,
        reading: RangeReading::Invalid(SensorError::EchoTimeout),
        answer: DeliveryOutcome::Responded(200),
        posts: 0,
        offline_posts: 0,
        led: false,
    };
    let mut app = AppService::new(config, 0xABCD);
    app.start(0, &mut io, &mut Discard);

    let mut now = 0u64;
    for &b in ticks {
        now += 10;
        io.link = b & 0x01 != 0;
        if b & 0x02 != 0 {
            let garbage = [b; 7];
            let payload: &[u8] = if b & 0x04 != 0 { marker.as_bytes() } else { &garbage };
            io.pending = Some(Datagram::new(Ipv4Addr::new(10, 0, 0, b), payload));
        }
        io.reading = if b & 0x08 != 0 {
            RangeReading::Valid(f32::from(b >> 2))
        } else {
            RangeReading::Invalid(SensorError::OutOfRange)
        };
        io.answer = match b >> 6 {
            0 => DeliveryOutcome::Responded(200),
            1 => DeliveryOutcome::Responded(503),
            2 => DeliveryOutcome::Failed(CommsError::HttpTimeout),
            _ => DeliveryOutcome::Failed(CommsError::HttpConnectFailed),
        };

        app.tick(now, &mut io, &mut Discard);

        assert_eq!(io.offline_posts, 0);
        assert_eq!(app.counter(), io.posts);
        if app.state() == StateId::Running {
            assert!(app.endpoint().is_some());
            assert!(io.led);
        }
    }
});
