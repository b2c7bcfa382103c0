//! Status LED pattern engine.
//!
//! The FSM writes a [`LedPattern`] into its context; the service feeds it
//! to a [`LedBlinker`] every tick and pushes the resulting level to the
//! LED port.
//!
//! | State          | Pattern                 | Default period |
//! |----------------|-------------------------|----------------|
//! | ConnectingWifi | Toggle (fast)           | 100 ms         |
//! | FindingServer  | Toggle (slow)           | 1000 ms        |
//! | Running        | Solid                   | -              |
//!
//! Switching pattern restarts the blink phase, so entering a state always
//! begins with a full period.

use crate::config::SystemConfig;
use crate::fsm::StateId;

/// What the LED should be doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedPattern {
    Off,
    Solid,
    /// Invert the level every `every_ms` milliseconds.
    Toggle { every_ms: u32 },
}

impl LedPattern {
    /// Pattern for a state.  Depends on nothing but the state and config.
    pub fn for_state(state: StateId, config: &SystemConfig) -> Self {
        match state {
            StateId::ConnectingWifi => Self::Toggle {
                every_ms: config.led_connecting_toggle_ms,
            },
            StateId::FindingServer => Self::Toggle {
                every_ms: config.led_discovering_toggle_ms,
            },
            StateId::Running => Self::Solid,
        }
    }

    fn initial_level(self) -> bool {
        matches!(self, Self::Solid)
    }
}

/// On/off level plus the time of the last toggle.  Stack-allocated, no heap.
#[derive(Debug, Clone)]
pub struct LedBlinker {
    pattern: LedPattern,
    level: bool,
    last_toggle_ms: u64,
}

impl LedBlinker {
    pub fn new() -> Self {
        Self {
            pattern: LedPattern::Off,
            level: false,
            last_toggle_ms: 0,
        }
    }

    /// Switch pattern.  A no-op if unchanged; otherwise the phase restarts
    /// at `now_ms`.
    pub fn set_pattern(&mut self, pattern: LedPattern, now_ms: u64) {
        if pattern == self.pattern {
            return;
        }
        self.pattern = pattern;
        self.level = pattern.initial_level();
        self.last_toggle_ms = now_ms;
    }

    /// Advance to `now_ms` and return the level to drive.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if let LedPattern::Toggle { every_ms } = self.pattern {
            if now_ms.saturating_sub(self.last_toggle_ms) >= u64::from(every_ms) {
                self.level = !self.level;
                self.last_toggle_ms = now_ms;
            }
        }
        self.level
    }

    pub fn pattern(&self) -> LedPattern {
        self.pattern
    }

    pub fn level(&self) -> bool {
        self.level
    }
}

impl Default for LedBlinker {
    fn default() -> Self {
        Self::new()
    }
}
