//! Unified error types for the RangeLink firmware.
//!
//! `SensorError` rides inside readings and `CommsError` inside delivery
//! outcomes; both are `Copy` so they travel without allocation.  `Error`
//! wraps `CommsError` for the fallible constructors.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Error returned by fallible adapter constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A network subsystem failed.
    Comms(CommsError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comms(e) => write!(f, "comms: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Echo line never went high, or stayed high past the timeout.
    EchoTimeout,
    /// Computed distance was non-positive or beyond the maximum range.
    OutOfRange,
    /// Driving the trigger line failed.
    GpioWriteFailed,
    /// Sampling the echo line failed.
    GpioReadFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EchoTimeout => write!(f, "no echo before timeout"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
        }
    }
}

impl std::error::Error for SensorError {}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The discovery socket could not be bound.
    DiscoveryBindFailed,
    /// The HTTP client could not be constructed.
    HttpClientInit,
    /// TCP connection to the server could not be established.
    HttpConnectFailed,
    /// Connected, but the request or response failed in transit.
    HttpRequestFailed,
    /// The request did not complete within the transport timeout.
    HttpTimeout,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiscoveryBindFailed => write!(f, "discovery socket bind failed"),
            Self::HttpClientInit => write!(f, "HTTP client init failed"),
            Self::HttpConnectFailed => write!(f, "HTTP connect failed"),
            Self::HttpRequestFailed => write!(f, "HTTP request failed"),
            Self::HttpTimeout => write!(f, "HTTP request timed out"),
        }
    }
}

impl std::error::Error for CommsError {}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
