//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  StateTable                                                   │
//! │  ┌────────────────┬────────────┬───────────┬───────────────┐  │
//! │  │ StateId        │ on_enter   │ on_exit   │ on_update     │  │
//! │  ├────────────────┼────────────┼───────────┼───────────────┤  │
//! │  │ ConnectingWifi │ fn(ctx,io) │ -         │ fn -> Option  │  │
//! │  │ FindingServer  │ fn(ctx,io) │ fn(ctx,io)│ fn -> Option  │  │
//! │  │ Running        │ fn(ctx,io) │ fn(ctx,io)│ fn -> Option  │  │
//! │  └────────────────┴────────────┴───────────┴───────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer.  Every handler receives `&mut FsmContext` (timers,
//! endpoint, LED command, counters) and `&mut P`, the node's ports.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all node states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    ConnectingWifi = 0,
    FindingServer = 1,
    Running = 2,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 3;

    pub fn name(self) -> &'static str {
        match self {
            Self::ConnectingWifi => "ConnectingWifi",
            Self::FindingServer => "FindingServer",
            Self::Running => "Running",
        }
    }
}

impl core::fmt::Display for StateId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn<P> = fn(&mut FsmContext, &mut P);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn<P> = fn(&mut FsmContext, &mut P) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array; no heap, no `dyn`.
pub struct StateDescriptor<P> {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn<P>>,
    pub on_exit: Option<StateActionFn<P>>,
    pub on_update: StateUpdateFn<P>,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]).  The context and
/// the ports are passed in on every call so the caller keeps ownership.
pub struct Fsm<P> {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor<P>; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Monotonically increasing tick counter.
    tick_count: u64,
    /// Tick at which the current state was entered.
    state_entry_tick: u64,
}

impl<P> Fsm<P> {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor<P>; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext, io: &mut P) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx, io);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut FsmContext, io: &mut P) {
        self.tick_count += 1;
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;

        let next = (self.table[self.current].on_update)(ctx, io);

        if let Some(next_id) = next {
            self.transition(next_id, ctx, io);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        self.table[self.current].id
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext, io: &mut P) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx, io);
        }

        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.ticks_in_state = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx, io);
        }
    }
}

// ---------------------------------------------------------------------------
// In-module test double
// ---------------------------------------------------------------------------
