//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: write to the serial console, record
//! them in a test, etc.

use std::net::Ipv4Addr;

use super::ports::{DeliveryOutcome, ServerEndpoint};
use crate::fsm::StateId;
use crate::sensors::RangeReading;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A beacon with the exact marker arrived.
    ServerDiscovered(ServerEndpoint),

    /// A datagram arrived on the discovery port but did not match.
    DatagramIgnored { source: Ipv4Addr, len: usize },

    /// The discovery socket could not be armed (retried next tick).
    DiscoveryUnavailable,

    /// A fresh distance measurement.
    Reading(RangeReading),

    /// A qualifying reading was suppressed by the trigger debounce.
    Debounced(RangeReading),

    /// A POST got an answer from the server.
    Delivered { counter: u32, status: u16 },

    /// A POST failed; the session is dropped.
    DeliveryFailed { counter: u32, outcome: DeliveryOutcome },

    /// Wi-Fi was found down at send time.
    LinkLost,
}
