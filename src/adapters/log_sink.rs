//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART on the node, stderr on a PC).  Every record starts
//! with a fixed tag so serial captures can be grepped.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::sensors::RangeReading;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink {
    label: heapless::String<16>,
}

impl LogEventSink {
    /// `label` prefixes the start record (e.g. `RL-EFCAFE`).
    pub fn new(label: &str) -> Self {
        let mut l = heapless::String::new();
        for c in label.chars() {
            if l.push(c).is_err() {
                break;
            }
        }
        Self { label: l }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | device={} | initial_state={}", self.label, state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::ServerDiscovered(endpoint) => {
                info!("DISCOVERY | server at {}", endpoint);
            }
            AppEvent::DatagramIgnored { source, len } => {
                debug!("DISCOVERY | ignored {} bytes from {}", len, source);
            }
            AppEvent::DiscoveryUnavailable => {
                warn!("DISCOVERY | listener could not bind");
            }
            AppEvent::Reading(RangeReading::Valid(cm)) => {
                debug!("RANGE | {:.2} cm", cm);
            }
            AppEvent::Reading(RangeReading::Invalid(e)) => {
                debug!("RANGE | invalid ({})", e);
            }
            AppEvent::Debounced(reading) => {
                debug!("RANGE | {:.2} cm suppressed by debounce", reading.centimetres());
            }
            AppEvent::Delivered { counter, status } => {
                info!("POST | #{} -> HTTP {}", counter, status);
            }
            AppEvent::DeliveryFailed { counter, outcome } => {
                warn!("POST | #{} failed: {}", counter, outcome);
            }
            AppEvent::LinkLost => {
                warn!("LINK | WiFi lost at send time");
            }
        }
    }
}
