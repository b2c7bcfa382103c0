//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the rules of the RangeLink node: the connection
//! state machine orchestration, the delivery payload and the events it
//! reports.  All interaction with Wi-Fi, sockets and pins happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod payload;
pub mod ports;
pub mod service;
