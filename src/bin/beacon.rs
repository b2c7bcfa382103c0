//! Bench stand-in for the collector's discovery broadcaster.
//!
//! Sends the discovery marker to the multicast group every 5 s (TTL 2) so
//! a node can be brought up without the real server.  Group, port and
//! marker come from the node's default configuration; `BEACON_INTERVAL_MS`
//! overrides the period.

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    use std::net::SocketAddrV4;
    use std::time::Duration;

    use anyhow::Context;
    use log::{info, warn};
    use rangelink::adapters::discovery::DiscoveryBeacon;
    use rangelink::config::SystemConfig;

    const DEFAULT_INTERVAL_MS: u64 = 5_000;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
        .context("logger already initialised")?;

    let config = SystemConfig::default();
    let interval_ms = std::env::var("BEACON_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_INTERVAL_MS);

    let dest = SocketAddrV4::new(config.discovery_group_addr(), config.discovery_port);
    let beacon = DiscoveryBeacon::new(dest).context("beacon socket")?;
    info!(
        "Beacon: announcing '{}' to {} every {} ms",
        config.discovery_marker, dest, interval_ms
    );

    loop {
        match beacon.announce(&config.discovery_marker) {
            Ok(n) => info!("Beacon: sent {} bytes to {}", n, beacon.dest()),
            Err(e) => warn!("Beacon: send failed: {}", e),
        }
        std::thread::sleep(Duration::from_millis(interval_ms));
    }
}

#[cfg(target_os = "espidf")]
fn main() {}
