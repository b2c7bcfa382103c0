//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements        | Connects to                     |
//! |---------------|-------------------|---------------------------------|
//! | `wifi`        | ConnectivityPort  | ESP-IDF WiFi STA / host network |
//! | `discovery`   | DiscoveryPort     | UDP multicast socket            |
//! | `http_client` | DeliveryPort      | esp-idf HTTP client / reqwest   |
//! | `node`        | all of the above  | bundles them for the service    |
//! |               | RangeSensorPort   | HC-SR04 or simulated ranger     |
//! |               | StatusLedPort     | status LED GPIO                 |
//! | `log_sink`    | EventSink         | Serial log output               |
//! | `time`        | MicrosClock       | ESP32 system timer              |

pub mod device_id;
pub mod discovery;
pub mod http_client;
pub mod log_sink;
pub mod node;
pub mod time;
pub mod wifi;
