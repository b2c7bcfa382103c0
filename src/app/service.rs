//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the FSM, its shared context and the LED blinker.
//! It exposes a clean, hardware-agnostic API.  All I/O flows through
//! port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  ConnectivityPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!  DiscoveryPort    ──▶ │        AppService         │
//!  RangeSensorPort  ──▶ │  FSM · LED blinker        │ ──▶ DeliveryPort
//!                       └──────────────────────────┘ ──▶ StatusLedPort
//! ```

use log::info;

use crate::config::SystemConfig;
use crate::drivers::led_patterns::LedBlinker;
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};

use super::events::AppEvent;
use super::ports::{EventSink, NodePorts, ServerEndpoint};

/// The application service orchestrates all domain logic.
pub struct AppService<P> {
    fsm: Fsm<P>,
    ctx: FsmContext,
    blinker: LedBlinker,
}

impl<P: NodePorts> AppService<P> {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig, chip_id: u32) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), StateId::ConnectingWifi),
            ctx: FsmContext::new(config, chip_id),
            blinker: LedBlinker::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in ConnectingWifi.
    pub fn start(&mut self, now_ms: u64, io: &mut P, sink: &mut impl EventSink) {
        self.ctx.now_ms = now_ms;
        self.fsm.start(&mut self.ctx, io);
        self.drive_led(now_ms, io);
        self.flush_events(sink);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!(
            "AppService started in {} (chipId={})",
            self.fsm.current_state(),
            self.ctx.chip_id
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one cycle: FSM → LED → events.
    ///
    /// `io` satisfies every port at once, which avoids juggling several
    /// mutable borrows while keeping the port boundary explicit.
    pub fn tick(&mut self, now_ms: u64, io: &mut P, sink: &mut impl EventSink) {
        let prev_state = self.fsm.current_state();

        self.ctx.now_ms = now_ms;
        self.fsm.tick(&mut self.ctx, io);
        self.drive_led(now_ms, io);
        self.flush_events(sink);

        let new_state = self.fsm.current_state();
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }
    }

    fn drive_led(&mut self, now_ms: u64, io: &mut P) {
        self.blinker.set_pattern(self.ctx.led, now_ms);
        io.set_led(self.blinker.tick(now_ms));
    }

    fn flush_events(&mut self, sink: &mut impl EventSink) {
        for event in core::mem::take(&mut self.ctx.events) {
            sink.emit(&event);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn endpoint(&self) -> Option<ServerEndpoint> {
        self.ctx.endpoint
    }

    /// POST attempts so far.
    pub fn counter(&self) -> u32 {
        self.ctx.counter
    }

    pub fn led_level(&self) -> bool {
        self.blinker.level()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }
}
