//! Sensor subsystem: the ultrasonic ranger and its reading type.
//!
//! Every measurement produces a fresh [`RangeReading`].  Faults are carried
//! inside the reading rather than returned as errors: the state machine
//! decides per delivery mode whether an invalid reading is sent (as the
//! `0.00` sentinel) or filtered out.

pub mod ultrasonic;

use crate::error::SensorError;

/// Result of one echo measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeReading {
    /// Distance to the target in centimetres (always `> 0`).
    Valid(f32),
    /// Timeout or out-of-range echo.
    Invalid(SensorError),
}

impl RangeReading {
    /// Distance in centimetres, or the `0.0` sentinel for invalid reads.
    pub fn centimetres(&self) -> f32 {
        match self {
            Self::Valid(cm) => *cm,
            Self::Invalid(_) => 0.0,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// `true` if the reading lies in `[min_cm, max_cm]`, both ends inclusive.
    /// Invalid readings never qualify.
    pub fn within(&self, min_cm: f32, max_cm: f32) -> bool {
        match self {
            Self::Valid(cm) => *cm >= min_cm && *cm <= max_cm,
            Self::Invalid(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "espidf"))]
pub use sim::{SimRangeSensor, sim_set_distance_cm};

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicU32, Ordering};

    use super::RangeReading;
    use crate::app::ports::RangeSensorPort;
    use crate::error::SensorError;

    /// Simulated distance in hundredths of a centimetre; 0 = no echo.
    static SIM_DISTANCE_CENTI_CM: AtomicU32 = AtomicU32::new(0);

    /// Set the distance the simulated ranger reports (`<= 0` → no echo).
    pub fn sim_set_distance_cm(cm: f32) {
        let centi = if cm > 0.0 { (cm * 100.0).round() as u32 } else { 0 };
        SIM_DISTANCE_CENTI_CM.store(centi, Ordering::Relaxed);
    }

    /// Stand-in for the HC-SR04 when running on a PC.
    pub struct SimRangeSensor {
        max_range_cm: f32,
    }

    impl SimRangeSensor {
        pub fn new(max_range_cm: f32) -> Self {
            Self { max_range_cm }
        }
    }

    impl RangeSensorPort for SimRangeSensor {
        fn measure(&mut self) -> RangeReading {
            let centi = SIM_DISTANCE_CENTI_CM.load(Ordering::Relaxed);
            if centi == 0 {
                return RangeReading::Invalid(SensorError::EchoTimeout);
            }
            let cm = centi as f32 / 100.0;
            if cm > self.max_range_cm {
                return RangeReading::Invalid(SensorError::OutOfRange);
            }
            RangeReading::Valid(cm)
        }
    }
}
