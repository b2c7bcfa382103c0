//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.  This is the classic embedded C FSM pattern
//! expressed in safe Rust, made generic over the node's ports.
//!
//! ```text
//!  CONNECTING_WIFI ──[link up]──▶ FINDING_SERVER ──[exact marker]──▶ RUNNING
//!        ▲                               ▲                             │
//!        │                               └──────[POST failed]──────────┤
//!        └─────────────────────[link down at send time]────────────────┘
//! ```

use log::{debug, info, warn};

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use crate::app::events::AppEvent;
use crate::app::payload::DeliveryPayload;
use crate::app::ports::{DeliveryOutcome, NodePorts, ServerEndpoint};
use crate::config::DeliveryMode;
use crate::drivers::led_patterns::LedPattern;
use crate::sensors::RangeReading;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table<P: NodePorts>() -> [StateDescriptor<P>; StateId::COUNT] {
    [
        // Index 0: ConnectingWifi
        StateDescriptor {
            id: StateId::ConnectingWifi,
            name: "ConnectingWifi",
            on_enter: Some(connecting_enter::<P>),
            on_exit: None,
            on_update: connecting_update::<P>,
        },
        // Index 1: FindingServer
        StateDescriptor {
            id: StateId::FindingServer,
            name: "FindingServer",
            on_enter: Some(finding_enter::<P>),
            on_exit: Some(finding_exit::<P>),
            on_update: finding_update::<P>,
        },
        // Index 2: Running
        StateDescriptor {
            id: StateId::Running,
            name: "Running",
            on_enter: Some(running_enter::<P>),
            on_exit: Some(running_exit::<P>),
            on_update: running_update::<P>,
        },
    ]
}

fn show(ctx: &mut FsmContext, state: StateId) {
    ctx.led = LedPattern::for_state(state, &ctx.config);
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTING_WIFI state
// ═══════════════════════════════════════════════════════════════════════════

fn connecting_enter<P: NodePorts>(ctx: &mut FsmContext, _io: &mut P) {
    show(ctx, StateId::ConnectingWifi);
    info!("CONNECTING_WIFI: waiting for association");
}

fn connecting_update<P: NodePorts>(ctx: &mut FsmContext, io: &mut P) -> Option<StateId> {
    if !io.is_connected() {
        return None;
    }
    match io.rssi() {
        Some(rssi) => info!(
            "CONNECTING_WIFI: link up after {} ticks (RSSI {} dBm)",
            ctx.ticks_in_state, rssi
        ),
        None => info!("CONNECTING_WIFI: link up after {} ticks", ctx.ticks_in_state),
    }
    Some(StateId::FindingServer)
}

// ═══════════════════════════════════════════════════════════════════════════
//  FINDING_SERVER state: waiting for the collector's multicast beacon
// ═══════════════════════════════════════════════════════════════════════════

fn arm_listener<P: NodePorts>(ctx: &mut FsmContext, io: &mut P) -> bool {
    match io.begin_discovery() {
        Ok(()) => {
            ctx.listener_armed = true;
            true
        }
        Err(e) => {
            debug!("FINDING_SERVER: listener not armed: {}", e);
            false
        }
    }
}

fn finding_enter<P: NodePorts>(ctx: &mut FsmContext, io: &mut P) {
    show(ctx, StateId::FindingServer);
    if arm_listener(ctx, io) {
        info!(
            "FINDING_SERVER: listening on {}:{}",
            ctx.config.discovery_group_addr(),
            ctx.config.discovery_port
        );
    } else {
        warn!("FINDING_SERVER: discovery socket unavailable, retrying every tick");
        ctx.emit(AppEvent::DiscoveryUnavailable);
    }
}

fn finding_exit<P: NodePorts>(ctx: &mut FsmContext, io: &mut P) {
    io.stop_discovery();
    ctx.listener_armed = false;
}

fn finding_update<P: NodePorts>(ctx: &mut FsmContext, io: &mut P) -> Option<StateId> {
    if !ctx.listener_armed && !arm_listener(ctx, io) {
        return None;
    }

    let datagram = io.poll_discovery()?;
    if !datagram.matches_marker(&ctx.config.discovery_marker) {
        ctx.emit(AppEvent::DatagramIgnored {
            source: datagram.source,
            len: datagram.payload.len(),
        });
        return None;
    }

    let endpoint = ServerEndpoint::new(datagram.source, ctx.config.server_port);
    info!("FINDING_SERVER: collector at {}", endpoint);
    ctx.endpoint = Some(endpoint);
    ctx.emit(AppEvent::ServerDiscovered(endpoint));
    Some(StateId::Running)
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUNNING state: measuring and delivering
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter<P: NodePorts>(ctx: &mut FsmContext, _io: &mut P) {
    show(ctx, StateId::Running);
    // Reset to "never", not to now: the first sample and the first POST are
    // due on the first Running tick, in both modes.
    ctx.last_sample_ms = None;
    ctx.last_delivery_ms = None;
    info!("RUNNING: {:?} mode", ctx.config.delivery_mode);
}

fn running_exit<P: NodePorts>(ctx: &mut FsmContext, _io: &mut P) {
    ctx.endpoint = None;
    ctx.led = LedPattern::Off;
}

fn running_update<P: NodePorts>(ctx: &mut FsmContext, io: &mut P) -> Option<StateId> {
    let Some(endpoint) = ctx.endpoint else {
        warn!("RUNNING: no endpoint, rediscovering");
        return Some(StateId::FindingServer);
    };

    match ctx.config.delivery_mode {
        DeliveryMode::Periodic => {
            if !ctx.elapsed(ctx.last_delivery_ms, ctx.config.post_interval_ms) {
                return None;
            }
            let reading = take_reading(ctx, io);
            deliver(ctx, io, endpoint, reading)
        }
        DeliveryMode::Trigger => {
            if !ctx.elapsed(ctx.last_sample_ms, ctx.config.sample_interval_ms) {
                return None;
            }
            ctx.last_sample_ms = Some(ctx.now_ms);

            let reading = take_reading(ctx, io);
            if !reading.within(ctx.config.trigger_min_cm, ctx.config.trigger_max_cm) {
                return None;
            }
            if !ctx.elapsed(ctx.last_delivery_ms, ctx.config.trigger_debounce_ms) {
                ctx.emit(AppEvent::Debounced(reading));
                return None;
            }
            deliver(ctx, io, endpoint, reading)
        }
    }
}

fn take_reading<P: NodePorts>(ctx: &mut FsmContext, io: &mut P) -> RangeReading {
    let reading = io.measure();
    ctx.emit(AppEvent::Reading(reading));
    reading
}

/// One POST attempt.  Any answer keeps the session; no answer drops it.
fn deliver<P: NodePorts>(
    ctx: &mut FsmContext,
    io: &mut P,
    endpoint: ServerEndpoint,
    reading: RangeReading,
) -> Option<StateId> {
    if !io.is_connected() {
        warn!("RUNNING: Wi-Fi lost, reconnecting");
        ctx.emit(AppEvent::LinkLost);
        return Some(StateId::ConnectingWifi);
    }

    let counter = ctx.counter.wrapping_add(1);
    let payload = DeliveryPayload {
        message: match ctx.config.delivery_mode {
            DeliveryMode::Periodic => Some(ctx.config.message.as_str()),
            DeliveryMode::Trigger => None,
        },
        counter,
        chip_id: ctx.chip_id,
        reading,
    };
    let body = match payload.to_json() {
        Ok(body) => body,
        Err(e) => {
            warn!("RUNNING: payload #{} not encoded: {}", counter, e);
            return None;
        }
    };

    // Committed only once there is something to send.
    ctx.last_delivery_ms = Some(ctx.now_ms);
    ctx.counter = counter;

    let outcome = io.post_json(&endpoint.url(&ctx.config.data_path), &body);
    match outcome {
        DeliveryOutcome::Responded(status) if outcome.keeps_session() => {
            if !outcome.is_success_status() {
                warn!("RUNNING: POST #{} answered HTTP {}", counter, status);
            }
            ctx.emit(AppEvent::Delivered { counter, status });
            None
        }
        _ => {
            warn!("RUNNING: POST #{} to {} failed ({})", counter, endpoint, outcome);
            ctx.emit(AppEvent::DeliveryFailed { counter, outcome });
            Some(StateId::FindingServer)
        }
    }
}
