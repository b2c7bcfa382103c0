//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters or loopback sockets.  All tests run on the host
//! (x86_64) with no real hardware or external network required.

#![cfg(not(target_os = "espidf"))]

mod app_service_tests;
mod delivery_tests;
mod discovery_tests;
mod mock_hw;
