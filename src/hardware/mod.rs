//! Hardware seams: the distance sensor and the drive.
//!
//! The controller only sees [`DistanceSensor`] and [`MotorDrive`]. Concrete
//! implementations sit on two lower seams, [`EchoPulse`] for the ultrasonic
//! transducer and [`DriveLines`] for the H-bridge inputs, so pin drivers can
//! be swapped without touching the timing or conversion logic.

mod bridge;
pub mod mock;
pub mod sim;
mod ultrasonic;

pub use bridge::{BridgeDrive, BridgeState};
pub use ultrasonic::{Ultrasonic, cm_to_echo, echo_to_cm};

use std::time::Duration;

/// Reading reported when no echo returns within the timeout.
///
/// Treated as "nothing ahead": a dead transducer never blocks motion.
pub const NO_ECHO_CM: u32 = 999;

/// Distance measurement ahead of the robot.
pub trait DistanceSensor: Send {
    /// Distance to the nearest obstacle in centimeters, or [`NO_ECHO_CM`].
    ///
    /// Bounded by the echo timeout; never blocks indefinitely.
    fn measure(&mut self) -> u32;
}

/// Open-loop drive. Durations are fixed; there is no encoder feedback.
pub trait MotorDrive: Send {
    /// Drive forward for the configured cell time, then stop.
    fn forward_one_cell(&mut self);

    /// Start a right turn. The caller times the turn and stops the motors.
    fn turn_right(&mut self);

    /// Release all motor inputs.
    fn stop(&mut self);
}

/// Ultrasonic transducer: emit a trigger pulse and time the echo.
pub trait EchoPulse: Send {
    /// Fire one pulse and return the echo width, or `None` if nothing
    /// returned within `timeout`.
    fn pulse(&mut self, timeout: Duration) -> Option<Duration>;
}

/// The four H-bridge input lines of a two-motor drive.
pub trait DriveLines: Send {
    fn set(&mut self, state: BridgeState);
}
