//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It holds timing, the learned server endpoint, the LED
//! command, delivery timers and counters, and the events raised during
//! the current tick.  Think of it as the "blackboard" in a blackboard
//! architecture; the ports themselves are passed alongside it.

use log::warn;

use crate::app::events::AppEvent;
use crate::app::ports::ServerEndpoint;
use crate::config::SystemConfig;
use crate::drivers::led_patterns::LedPattern;

/// Events buffered per tick before the service drains them to the sink.
pub const EVENT_QUEUE_LEN: usize = 8;

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Monotonic milliseconds, set by the service before each tick.
    pub now_ms: u64,
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,

    // -- Configuration --
    pub config: SystemConfig,
    /// 24-bit chip identifier reported as `chipId`.
    pub chip_id: u32,

    // -- Session --
    /// Collector endpoint; `Some` only while Running.
    pub endpoint: Option<ServerEndpoint>,
    /// Whether the discovery socket is currently bound and joined.
    pub listener_armed: bool,

    // -- Outputs --
    /// LED pattern requested by the current state.
    pub led: LedPattern,

    // -- Delivery --
    /// Last time a measurement was taken in Running (`None` = due now).
    pub last_sample_ms: Option<u64>,
    /// Last time a POST was attempted in Running (`None` = due now).
    pub last_delivery_ms: Option<u64>,
    /// Incremented on every POST attempt.
    pub counter: u32,

    /// Events raised during the current tick.
    pub events: heapless::Vec<AppEvent, EVENT_QUEUE_LEN>,
}

impl FsmContext {
    /// Create a new context with the given configuration.
    pub fn new(config: SystemConfig, chip_id: u32) -> Self {
        Self {
            now_ms: 0,
            ticks_in_state: 0,
            config,
            chip_id,
            endpoint: None,
            listener_armed: false,
            led: LedPattern::Off,
            last_sample_ms: None,
            last_delivery_ms: None,
            counter: 0,
            events: heapless::Vec::new(),
        }
    }

    /// Queue an event for the sink.  Drops (with a warning) when full.
    pub fn emit(&mut self, event: AppEvent) {
        if let Err(dropped) = self.events.push(event) {
            warn!("event queue full, dropping {:?}", dropped);
        }
    }

    /// `true` if at least `period_ms` has passed since `last`, or if
    /// there is no `last` yet.
    pub fn elapsed(&self, last: Option<u64>, period_ms: u32) -> bool {
        match last {
            Some(t) => self.now_ms.saturating_sub(t) >= u64::from(period_ms),
            None => true,
        }
    }
}
