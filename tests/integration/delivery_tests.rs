//! HTTP delivery against a one-shot local server, plus a full-stack run
//! of the node over loopback sockets.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Ipv4Addr, SocketAddrV4, TcpListener, UdpSocket};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rangelink::adapters::discovery::{DiscoveryBeacon, MulticastListener};
use rangelink::adapters::http_client::HttpDeliveryClient;
use rangelink::adapters::node::NodeAdapter;
use rangelink::adapters::wifi::WifiAdapter;
use rangelink::app::ports::{DeliveryOutcome, DeliveryPort};
use rangelink::app::service::AppService;
use rangelink::config::{DeliveryMode, SystemConfig};
use rangelink::drivers::sim_pin::SimPin;
use rangelink::drivers::status_led::StatusLed;
use rangelink::error::CommsError;
use rangelink::fsm::StateId;
use rangelink::sensors::{SimRangeSensor, sim_set_distance_cm};

use super::mock_hw::RecordingSink;

/// What the fake collector saw.
struct Captured {
    head: String,
    body: String,
}

/// Accept one connection, read one request, answer with `status`.
fn one_shot_server(status: u16) -> (u16, mpsc::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut head = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
            if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = v.trim().parse().unwrap();
            }
            head.push_str(&line);
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).unwrap();
        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {} X\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            status
        )
        .unwrap();
        let _ = tx.send(Captured {
            head,
            body: String::from_utf8(body).unwrap(),
        });
    });
    (port, rx)
}

#[test]
fn post_carries_json_and_reports_status() {
    let (port, rx) = one_shot_server(200);
    let mut client = HttpDeliveryClient::new(2_000).unwrap();
    let body = r#"{"counter":1,"chipId":15715070,"distance":20.00}"#;

    let outcome = client.post_json(&format!("http://127.0.0.1:{}/data", port), body);
    assert_eq!(outcome, DeliveryOutcome::Responded(200));

    let seen = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(seen.head.starts_with("POST /data HTTP/1.1"), "{}", seen.head);
    assert!(
        seen.head.to_ascii_lowercase().contains("content-type: application/json"),
        "{}",
        seen.head
    );
    assert_eq!(seen.body, body);
}

#[test]
fn server_error_is_still_a_response() {
    let (port, _rx) = one_shot_server(500);
    let mut client = HttpDeliveryClient::new(2_000).unwrap();
    let outcome = client.post_json(&format!("http://127.0.0.1:{}/data", port), "{}");
    assert_eq!(outcome, DeliveryOutcome::Responded(500));
    assert!(outcome.keeps_session());
    assert!(!outcome.is_success_status());
}

#[test]
fn silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let (_stream, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_secs(3));
    });

    let mut client = HttpDeliveryClient::new(300).unwrap();
    let outcome = client.post_json(&format!("http://127.0.0.1:{}/data", port), "{}");
    assert_eq!(outcome, DeliveryOutcome::Failed(CommsError::HttpTimeout));
}

#[test]
fn full_stack_over_loopback() {
    let (http_port, rx) = one_shot_server(200);
    let discovery_port = {
        let probe = UdpSocket::bind("0.0.0.0:0").unwrap();
        probe.local_addr().unwrap().port()
    };

    let config = SystemConfig {
        delivery_mode: DeliveryMode::Trigger,
        discovery_port,
        server_port: http_port,
        ..SystemConfig::default()
    };

    let mut wifi = WifiAdapter::new();
    wifi.set_credentials("bench", "").unwrap();
    wifi.connect(0).unwrap();
    wifi.poll(0);

    sim_set_distance_cm(20.0);
    let mut node = NodeAdapter::new(
        wifi,
        MulticastListener::new(config.discovery_group_addr(), config.discovery_port),
        HttpDeliveryClient::new(config.http_timeout_ms).unwrap(),
        SimRangeSensor::new(config.max_range_cm),
        StatusLed::new(SimPin::new("led"), config.led_active_low),
    );
    let mut sink = RecordingSink::new();
    let mut app = AppService::new(config.clone(), 0x00EF_CAFE);
    app.start(0, &mut node, &mut sink);

    let beacon = DiscoveryBeacon::new(SocketAddrV4::new(Ipv4Addr::LOCALHOST, discovery_port)).unwrap();
    let mut now = 0;
    while app.counter() == 0 && now < 5_000 {
        now += 10;
        if app.state() == StateId::FindingServer {
            beacon.announce(&config.discovery_marker).unwrap();
        }
        app.tick(now, &mut node, &mut sink);
        thread::sleep(Duration::from_millis(2));
    }

    assert_eq!(app.state(), StateId::Running);
    assert!(node.led_is_on());
    let seen = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(seen.body, r#"{"counter":1,"chipId":15715070,"distance":20.00}"#);
}
